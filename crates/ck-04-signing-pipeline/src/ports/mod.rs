//! Ports layer for the signing pipeline.

pub mod inbound;
pub mod outbound;
