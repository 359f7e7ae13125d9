//! # Config Store (CK-03)
//!
//! The process-wide connection state machine. Owns the connector
//! registry, folds connector events into immutable state snapshots,
//! fans changes out to observers and writes every change through to
//! storage.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `State`, `Connection`, the pure
//!   `connect`/`change`/`disconnect` folds, errors
//! - **Ports Layer** (`ports/`): `Storage` key-value backend plus
//!   `MemoryStorage`
//! - **Adapters Layer** (`adapters/`): `FileStorage`, versioned
//!   `PersistenceAdapter` (migrate + merge)
//! - **Service** (`service.rs`): `ConfigStore`
//!
//! ## Status transitions
//!
//! ```text
//!                 connect()                 connect folded
//! disconnected ─────────────▶ connecting ─────────────────▶ connected
//!      ▲                          │ ceremony failed             │
//!      └──────────────────────────┘                             │
//!      ▲                                                        │
//!      └──────────────── last disconnect folded ◀───────────────┘
//!
//! hydrated sessions ──▶ reconnecting ──reconnect()──▶ connected | disconnected
//! ```
//!
//! | Event | Folded when | Effect |
//! |-------|-------------|--------|
//! | `connect` | uid armed | upsert connection, map chain → uid, uid goes live |
//! | `change` | uid live | update present fields only |
//! | `disconnect` | uid live | remove connection and its chain mappings, re-arm uid |
//! | `error` / `message` | never | logged |

pub mod adapters;
pub mod config;
pub mod domain;
pub mod observers;
pub mod ports;
pub mod registry;
pub mod service;

// Re-export public API
pub use adapters::file_storage::FileStorage;
pub use adapters::persistence::{PersistedEnvelope, PersistenceAdapter};
pub use config::{StoreConfig, DEFAULT_STORAGE_KEY, SCHEMA_VERSION};
pub use domain::errors::{PersistenceError, StoreError};
pub use domain::state::{Connection, PersistedState, State};
pub use observers::{FoldOutcome, ObserverList, SubscriptionId};
pub use ports::outbound::{MemoryStorage, Storage};
pub use registry::ConnectorRegistry;
pub use service::{ConfigStore, ListenerPhase};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
