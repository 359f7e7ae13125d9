//! Domain layer for the signing pipeline.

pub mod entities;
pub mod errors;
