//! # Connect Runtime
//!
//! Composition root for connect-kit.
//!
//! ## Modular Structure
//!
//! - `container/` - `KitConfig` and the `ConnectKit` component container
//! - `wiring/` - metric hooks installed on the store and around signing
//! - `cli/` - the `connect-kit` command line tool
//!
//! ## Component Graph
//!
//! ```text
//!   KitConfig ──▶ ClientCache ──▶ ConnectorRegistry ──▶ ConfigStore ◀── Storage
//!                                        ▲                   │            (file | memory)
//!                         setup_connector│                   ▼
//!                                        │          SigningPipeline<Arc<ConfigStore>>
//!                                   ConnectKit ──────────────┘
//!                                        │
//!                                        └──▶ fold loop (ConfigStore::run)
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`KitConfig::from_env`) and validate it
//! 2. Build chain clients, registry, store (hydrates persisted sessions)
//! 3. Register connectors with `setup_connector`
//! 4. `start()`: spawn the fold loop, then `reconnect()` hydrated sessions

pub mod cli;
pub mod container;
pub mod wiring;

pub use container::{ConfigError, ConnectKit, KitConfig, StorageConfig};
