//! # Pipeline Errors

use ck_01_chain_client::ChainClientError;
use ck_02_connectors::ConnectorError;
use ck_03_config_store::StoreError;
use shared_crypto::CryptoError;
use shared_types::{ChainId, Uid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No connection for connector {0}")]
    ConnectionNotFound(Uid),

    #[error("No connector is connected on chain {0}")]
    NoConnectionForChain(ChainId),

    #[error("Connector not found: {0}")]
    ConnectorNotFound(Uid),

    /// The connector holds no proven key.
    #[error("Not authorized")]
    NotAuthorized,

    #[error("No sender: connection {0} has no active account")]
    NoSender(Uid),

    /// The connection was removed or re-seated while the transaction was
    /// being signed.
    #[error("Connection {0} changed while signing")]
    ConnectionChanged(Uid),

    /// The chain id could not be resolved; nothing was signed.
    #[error("Failed to resolve chain id: {0}")]
    ChainId(#[source] ChainClientError),

    #[error("failed to broadcast tx! codespace: {codespace}, code: {code}, log: {log}")]
    Broadcast {
        codespace: String,
        code: u32,
        log: String,
    },

    #[error("Account factory not configured for chain {0}")]
    AccountFactoryNotConfigured(ChainId),

    #[error("Account code hash not configured for chain {0}")]
    CodeHashNotConfigured(ChainId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    ChainClient(#[from] ChainClientError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_message_is_verbatim() {
        let err = PipelineError::Broadcast {
            codespace: "tx".to_string(),
            code: 5,
            log: "insufficient funds".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to broadcast tx! codespace: tx, code: 5, log: insufficient funds"
        );
    }
}
