//! # Wallet Connectors (CK-02)
//!
//! One adapter per wallet technology, all behind the `WalletConnector`
//! capability set and dispatched through the closed `Connector` enum.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): sign documents, connect parameters,
//!   session state, errors
//! - **Ports Layer** (`ports/`): `WalletConnector` (inbound), wallet
//!   provider traits plus in-crate mocks (outbound)
//! - **Adapters Layer** (`adapters/`): EIP-1193 and passkey connectors
//!
//! ## Lifecycle
//!
//! ```text
//! connect(params)
//!   ├─ begin attempt (supersedes anything in flight)
//!   ├─ ceremony: personal_sign / WebAuthn assertion   (skipped with key_hash)
//!   ├─ key fingerprint ∈ keys_by_user(username)?      (else NotAuthorized)
//!   ├─ accounts_by_user(username)
//!   └─ emit connect                                   (only if attempt still current)
//!
//! disconnect()
//!   └─ clear authorization, emit disconnect           (always Ok)
//! ```
//!
//! | Connector | Ceremony | Key fingerprint | Tx signature |
//! |-----------|----------|-----------------|--------------|
//! | `eip1193` | `personal_sign` | sha256(recovered compressed pubkey) | EIP-712 |
//! | `passkey` | WebAuthn assertion | sha256(credential id) | secp256r1 |

pub mod adapters;
pub mod config;
pub mod connector;
pub mod context;
pub mod discovery;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use adapters::eip1193::Eip1193Connector;
pub use adapters::passkey::PasskeyConnector;
pub use config::ConnectorConfig;
pub use connector::{Connector, ConnectorSpec};
pub use context::ConnectorContext;
pub use discovery::{Eip6963ProviderDetail, Eip6963ProviderInfo};
pub use domain::entities::{ConnectParameters, NewKey, SignDoc, SignedPayload};
pub use domain::errors::ConnectorError;
pub use domain::session::{Session, SessionState};
pub use ports::inbound::WalletConnector;
pub use ports::outbound::{
    Eip1193Provider, MockAuthenticator, MockEip1193Wallet, WebAuthnAssertion, WebAuthnAuthenticator,
    WebAuthnCredential,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
