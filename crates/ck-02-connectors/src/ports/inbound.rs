//! # Inbound Port
//!
//! The capability set every connector exposes to the config store and
//! the signing pipeline.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Account, ChainId, ConnectorInfo, Credential, KeyHash, Username};

use crate::domain::entities::{ConnectParameters, NewKey, SignDoc, SignedPayload};
use crate::domain::errors::ConnectorError;

#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Serializable identity (`id`, `name`, `type`, `uid`).
    fn info(&self) -> &ConnectorInfo;

    fn icon(&self) -> Option<&str>;

    /// Whether a key was proven for the seated session. Pure read.
    fn is_authorized(&self) -> bool;

    /// Run the authentication ceremony and emit `connect`.
    ///
    /// Nothing is emitted on failure.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` if the proven fingerprint is not registered
    /// - `ChainNotConfigured` for an unknown chain id
    /// - `Superseded` if `disconnect` ran while the ceremony was in flight
    async fn connect(&self, params: ConnectParameters) -> Result<(), ConnectorError>;

    /// Drop the session and emit `disconnect`. Idempotent; never fails.
    async fn disconnect(&self) -> Result<(), ConnectorError>;

    /// Accounts of the seated user.
    async fn get_accounts(&self) -> Result<Vec<Account>, ConnectorError>;

    /// Fingerprint of the key the wallet signs with, via a random challenge.
    async fn get_key_hash(&self) -> Result<KeyHash, ConnectorError>;

    /// Produce a registrable key. `None` uses the configured default challenge.
    async fn create_new_key(&self, challenge: Option<&str>) -> Result<NewKey, ConnectorError>;

    /// Sign a transaction. Only the authorization flag may change.
    async fn sign_tx(&self, doc: &SignDoc) -> Result<Credential, ConnectorError>;

    /// Sign an off-chain JSON payload.
    async fn sign_arbitrary(&self, payload: &Value) -> Result<SignedPayload, ConnectorError>;

    /// Re-seat the session after rehydration, without a ceremony.
    fn on_connect(&self, chain_id: &ChainId, username: &Username);

    async fn switch_chain(&self, _chain_id: &ChainId) -> Result<(), ConnectorError> {
        Err(ConnectorError::Unsupported("switch_chain"))
    }
}
