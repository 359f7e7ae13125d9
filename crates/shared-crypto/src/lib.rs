//! # Shared Crypto - Key Material & Address Derivation
//!
//! Pure, deterministic functions used by connectors and the signing
//! pipeline. Nothing in this crate performs I/O.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256, RIPEMD-160, Keccak-256 | Digests |
//! | `address` | RIPEMD-160(SHA-256(..)) | Account/contract address, salt, key fingerprint |
//! | `sign_bytes` | SHA-256 over canonical JSON | Transaction sign bytes |
//! | `ecdsa` | secp256k1 | EIP-191 message hash, public key recovery |
//! | `eip712` | Keccak-256 | Typed data signed by browser wallets |
//! | `secp256r1` | P-256 | Passkey signature normalisation |
//!
//! ## Wire Compatibility
//!
//! The byte layouts in `address` and `sign_bytes` are verified on chain by
//! the account contract. Their order must never change.

#![warn(clippy::all)]

pub mod address;
pub mod ecdsa;
pub mod eip712;
pub mod errors;
pub mod hashing;
pub mod secp256r1;
pub mod sign_bytes;

// Re-exports
pub use address::{
    derive_address, key_hash_from_credential_id, key_hash_from_public_key, new_user_salt,
};
pub use ecdsa::{eth_hash_message, recover_secp256k1_public_key};
pub use eip712::{Eip712Domain, TxTypedData, TxTypedMessage, TypedData, TypedDataProperty};
pub use errors::CryptoError;
pub use hashing::{hash160, keccak256, ripemd160, sha256};
pub use secp256r1::secp256r1_signature_from_der;
pub use sign_bytes::{canonical_json, sign_bytes};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
