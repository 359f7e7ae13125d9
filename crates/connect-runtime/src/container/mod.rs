//! # Container
//!
//! Configuration and the component container.

pub mod config;
pub mod kit;

pub use config::{ConfigError, KitConfig, StorageConfig};
pub use kit::ConnectKit;
