//! Concrete connectors.

pub mod eip1193;
pub mod passkey;
