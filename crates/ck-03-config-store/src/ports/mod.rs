//! Ports layer for the config store.

pub mod outbound;
