//! # Address Derivation
//!
//! Deterministic account/contract addresses and the inputs they are
//! derived from.
//!
//! ```text
//! salt    = len(username) as u8 ∥ username ∥ key_hash ∥ account_type_code
//! address = ripemd160(sha256(deployer ∥ code_hash ∥ salt))
//! ```

use shared_types::{AccountType, Addr, Hash256, KeyHash};

use crate::errors::CryptoError;
use crate::hashing::{hash160, sha256};

/// Compute the address of a contract instantiated by `deployer` from
/// `code_hash` with `salt`.
pub fn derive_address(deployer: &Addr, code_hash: &Hash256, salt: &[u8]) -> Addr {
    let mut preimage = Vec::with_capacity(Addr::LENGTH + Hash256::LENGTH + salt.len());
    preimage.extend_from_slice(deployer.as_bytes());
    preimage.extend_from_slice(code_hash.as_bytes());
    preimage.extend_from_slice(salt);
    Addr(hash160(&preimage))
}

/// Salt the account factory uses when creating a user's account.
///
/// # Errors
///
/// `CryptoError::UsernameTooLong` if the username exceeds 255 bytes.
pub fn new_user_salt(
    username: &str,
    key_hash: &KeyHash,
    account_type: AccountType,
) -> Result<Vec<u8>, CryptoError> {
    let name = username.as_bytes();
    let len = u8::try_from(name.len()).map_err(|_| CryptoError::UsernameTooLong { len: name.len() })?;

    let mut salt = Vec::with_capacity(1 + name.len() + Hash256::LENGTH + 1);
    salt.push(len);
    salt.extend_from_slice(name);
    salt.extend_from_slice(key_hash.as_bytes());
    salt.push(account_type.code());
    Ok(salt)
}

/// Fingerprint of a secp256k1 public key (compressed SEC1 bytes).
pub fn key_hash_from_public_key(public_key: &[u8]) -> KeyHash {
    Hash256(sha256(public_key))
}

/// Fingerprint of a WebAuthn credential id.
pub fn key_hash_from_credential_id(credential_id: &[u8]) -> KeyHash {
    Hash256(sha256(credential_id))
}
