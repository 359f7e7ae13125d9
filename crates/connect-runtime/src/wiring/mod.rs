//! # Wiring
//!
//! Hooks the composition root installs on its components.

pub mod metrics;
