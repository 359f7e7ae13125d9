//! # Store Errors

use ck_01_chain_client::ChainClientError;
use ck_02_connectors::ConnectorError;
use shared_types::{Addr, ChainId, Uid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Chain id not provided")]
    ChainIdNotProvided,

    #[error("Chain not configured")]
    ChainNotConfigured(ChainId),

    #[error("Connector not found: {0}")]
    ConnectorNotFound(Uid),

    #[error("Connector {0} is already connected")]
    AlreadyConnected(Uid),

    #[error("No connection for connector {0}")]
    ConnectionNotFound(Uid),

    #[error("No connector is connected on chain {0}")]
    NoConnectionForChain(ChainId),

    #[error("Account {address} not found in connection {uid}")]
    AccountNotFound { uid: Uid, address: Addr },

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    ChainClient(#[from] ChainClientError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage is locked by another writer: {0}")]
    Locked(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
