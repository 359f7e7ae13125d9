//! Domain layer for connectors.

pub mod entities;
pub mod errors;
pub mod session;
