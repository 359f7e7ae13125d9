//! # Shared Types Crate
//!
//! Domain entities shared by every connect-kit crate.
//!
//! ## Clusters
//!
//! - **Identity**: `Addr`, `Hash256`/`KeyHash`, `ChainId`, `Username`, `Uid`
//! - **Accounts & Connections**: `Account`, `AccountType`, `ConnectorInfo`,
//!   `ConnectionStatus`
//! - **Transactions**: `Message`, `Coins`, `Metadata`, `Credential`,
//!   `Signature`, `Tx`, `UnsignedTx`
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: wire shapes are defined once here and
//!   serialized with serde; every other crate reuses them.
//! - **String-encoded identities**: addresses render as `0x` + lowercase hex,
//!   hashes as uppercase hex, binary blobs as base64.

pub mod entities;
pub mod errors;
pub mod tx;

pub use entities::*;
pub use errors::*;
pub use tx::*;
