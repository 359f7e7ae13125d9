//! # Signing Pipeline (CK-04)
//!
//! Turns a message list into a signed, broadcast transaction using the
//! connection the config store holds.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): request/outcome types, errors
//! - **Ports Layer** (`ports/`): `SigningApi` (inbound), `SessionSource`
//!   (outbound)
//! - **Adapters Layer** (`adapters/`): `SessionSource` for `ConfigStore`
//! - **Service** (`service.rs`): `SigningPipeline`
//!
//! ## Failure handling
//!
//! | Step | On failure |
//! |------|------------|
//! | authorization check | `NotAuthorized`, no network I/O |
//! | chain id | `ChainId`, fatal |
//! | sequence | falls back to `0` |
//! | connector sign | `Connector(..)` |
//! | simulate | `ChainClient(..)` |
//! | connection re-check | `ConnectionChanged` |
//! | broadcast `code != 0` | `Broadcast { codespace, code, log }`, not retried |

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use config::{GasConfig, PipelineConfig};
pub use domain::entities::{BroadcastOutcome, SignAndBroadcast};
pub use domain::errors::PipelineError;
pub use ports::inbound::SigningApi;
pub use ports::outbound::{SessionSource, SigningSession};
pub use service::SigningPipeline;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
