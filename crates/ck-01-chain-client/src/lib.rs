//! # Chain Client (CK-01)
//!
//! Request/response access to the chain through an opaque JSON-RPC
//! transport.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): wire shapes of ABCI queries, app queries
//!   and broadcast responses; error types
//! - **Ports Layer** (`ports/`): `ChainApi` (inbound) and `RpcTransport`
//!   (outbound, with the `MockChain` test double)
//! - **Adapters** (`adapters/`): `HttpTransport` over `reqwest`
//! - **Service Layer** (`service.rs`): `ChainClient`
//! - **Cache** (`cache.rs`): one memoised client per configured chain
//!
//! ## Wire Protocol
//!
//! | Call | JSON-RPC method | Notes |
//! |------|-----------------|-------|
//! | app query | `abci_query` path `/app` | data = hex(JSON request) |
//! | simulate | `abci_query` path `/simulate` | data = hex(JSON unsigned tx) |
//! | broadcast | `broadcast_tx_sync` | tx = base64(JSON tx) |
//!
//! A non-zero ABCI `code` on a query is reported as
//! `query failed! codespace: …, code: …, log: …`.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::http::HttpTransport;
pub use cache::ClientCache;
pub use config::{ChainConfig, TransportConfig};
pub use domain::entities::{
    AbciQueryResponse, AccountInfo, BlockInfo, BroadcastTxResponse, ChainInfo, Key, QueryRequest,
    QueryResponse, SimulateOutcome,
};
pub use domain::errors::{ChainClientError, TransportError};
pub use ports::inbound::ChainApi;
pub use ports::outbound::{MockChain, RpcTransport};
pub use service::ChainClient;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
