//! Ports layer for connectors.

pub mod inbound;
pub mod outbound;
