//! Domain layer for the config store.

pub mod errors;
pub mod fold;
pub mod state;
