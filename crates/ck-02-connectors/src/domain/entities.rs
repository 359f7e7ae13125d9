//! # Connector Entities

use ck_01_chain_client::Key;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{Addr, ChainId, Credential, Hash256, KeyHash, Message, Username};

/// Input of `WalletConnector::connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParameters {
    pub username: Username,
    pub chain_id: ChainId,
    /// Message the wallet signs to prove control of a registered key.
    #[serde(default)]
    pub challenge: Option<String>,
    /// Already proven key fingerprint. Skips the ceremony but is still
    /// checked against the registered key set.
    #[serde(default)]
    pub key_hash: Option<KeyHash>,
}

impl ConnectParameters {
    pub fn new(username: impl Into<Username>, chain_id: impl Into<ChainId>) -> Self {
        Self {
            username: username.into(),
            chain_id: chain_id.into(),
            challenge: None,
            key_hash: None,
        }
    }

    pub fn with_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    pub fn with_key_hash(mut self, key_hash: KeyHash) -> Self {
        self.key_hash = Some(key_hash);
        self
    }
}

/// What a connector is asked to sign for a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SignDoc {
    pub sender: Addr,
    pub msgs: Vec<Message>,
    pub chain_id: ChainId,
    pub sequence: u32,
    /// `sign_bytes(msgs, sender, chain_id, sequence)`.
    pub sign_bytes: Hash256,
}

/// A freshly created key, ready to be registered with the account factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKey {
    pub key: Key,
    pub key_hash: KeyHash,
}

/// Result of signing an off-chain payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedPayload {
    pub credential: Credential,
    pub payload: Value,
}
