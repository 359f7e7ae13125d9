//! Domain layer: wire entities and errors.

pub mod entities;
pub mod errors;
