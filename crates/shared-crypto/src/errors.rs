//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature bytes have the wrong length or encoding
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Recovery id outside 0, 1, 27, 28
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Public key recovery failed
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Username does not fit the single-byte length prefix
    #[error("Username too long: {len} bytes, max 255")]
    UsernameTooLong {
        /// Username length in bytes
        len: usize,
    },

    /// Invalid hex input
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Off-chain payload lacks `types` or `primaryType`
    #[error("Typed data required")]
    TypedDataRequired,

    /// Typed data does not match its declared types
    #[error("Invalid typed data: {0}")]
    InvalidTypedData(String),

    /// Canonical serialization failed
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
