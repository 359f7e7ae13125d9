//! # Error Types
//!
//! Parse and validation errors for the shared data model.

use thiserror::Error;

/// Errors produced while parsing or validating shared types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Address string is not `0x` followed by 40 hex characters.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Hash string is not 64 hex characters.
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    /// A fixed-size byte field received the wrong number of bytes.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Base64 payload could not be decoded.
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// Unknown account type tag.
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),
}
