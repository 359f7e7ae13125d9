//! # Connector Errors

use ck_01_chain_client::ChainClientError;
use shared_bus::EmitError;
use shared_crypto::CryptoError;
use shared_types::ChainId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The proven key fingerprint is not registered for the username.
    #[error("Not authorized")]
    NotAuthorized,

    #[error("{0} not detected")]
    ProviderNotDetected(String),

    /// The operation needs a seated session.
    #[error("Connector {0} is not connected")]
    NotConnected(String),

    #[error("{0} is not supported by this connector")]
    Unsupported(&'static str),

    #[error("Chain not configured: {0}")]
    ChainNotConfigured(ChainId),

    /// The wallet provider or authenticator rejected or failed the request.
    #[error("Provider error: {0}")]
    Provider(String),

    /// `disconnect` or a newer `connect` started while this one was in flight.
    #[error("Connect attempt superseded")]
    Superseded,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    ChainClient(#[from] ChainClientError),

    #[error("Event emission failed: {0}")]
    Emit(#[from] EmitError),
}
