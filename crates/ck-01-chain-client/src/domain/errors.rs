//! # Chain Client Errors

use thiserror::Error;

/// Errors raised by an `RpcTransport`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// HTTP layer failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// JSON-RPC error object returned by the node.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Node unreachable.
    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Errors from chain queries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainClientError {
    /// The transport failed before an ABCI response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The query executed and returned a non-zero code.
    #[error("query failed! codespace: {codespace}, code: {code}, log: {log}")]
    QueryFailed {
        codespace: String,
        code: u32,
        log: String,
    },

    /// The response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Request could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// The chain has no account factory configured.
    #[error("Account factory not configured for chain {0}")]
    AccountFactoryNotConfigured(String),
}
