//! # ECDSA (secp256k1)
//!
//! Helpers for browser-wallet signatures: the EIP-191 personal message hash
//! and recovery of the signer's compressed public key.
//!
//! Wallets return signatures as `0x` + hex of `r ∥ s ∥ v` (65 bytes) with
//! `v` in `{27, 28}` or `{0, 1}`.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::errors::CryptoError;
use crate::hashing::keccak256;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// EIP-191 hash of a personal message.
pub fn eth_hash_message(message: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + 8 + message.len());
    preimage.extend_from_slice(PERSONAL_MESSAGE_PREFIX.as_bytes());
    preimage.extend_from_slice(message.len().to_string().as_bytes());
    preimage.extend_from_slice(message);
    keccak256(&preimage)
}

/// Decode a `0x`-prefixed hex signature.
pub fn decode_hex_signature(signature: &str) -> Result<Vec<u8>, CryptoError> {
    let stripped = signature.strip_prefix("0x").unwrap_or(signature);
    hex::decode(stripped).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Recover the compressed (33-byte) public key that produced `signature`
/// over `prehash`.
///
/// # Errors
///
/// - `InvalidSignatureFormat` unless the signature is 65 bytes
/// - `InvalidRecoveryId` for a `v` outside 0, 1, 27, 28
/// - `RecoveryFailed` if no key matches
pub fn recover_secp256k1_public_key(
    prehash: &[u8; 32],
    signature: &[u8],
) -> Result<[u8; 33], CryptoError> {
    if signature.len() != 65 {
        return Err(CryptoError::InvalidSignatureFormat);
    }

    let v = signature[64];
    let recovery_byte = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(CryptoError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(CryptoError::InvalidRecoveryId(v))?;
    let sig = Signature::from_slice(&signature[..64]).map_err(|_| CryptoError::InvalidSignatureFormat)?;

    let key = VerifyingKey::recover_from_prehash(prehash, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    let encoded = key.to_encoded_point(true);
    encoded
        .as_bytes()
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn signing_key() -> SigningKey {
        let mut secret = [0u8; 32];
        secret[31] = 7;
        SigningKey::from_bytes((&secret).into()).unwrap()
    }

    fn sign(key: &SigningKey, prehash: &[u8; 32], offset: u8) -> Vec<u8> {
        let (sig, recid) = key.sign_prehash_recoverable(prehash).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + offset);
        bytes
    }

    #[test]
    fn test_eth_hash_message_prefix_changes_digest() {
        assert_ne!(eth_hash_message(b"hello"), keccak256(b"hello"));
        assert_eq!(eth_hash_message(b"hello"), eth_hash_message(b"hello"));
    }

    #[test]
    fn test_recover_matches_signer() {
        let key = signing_key();
        let prehash = eth_hash_message(b"challenge");
        let expected = key.verifying_key().to_encoded_point(true);

        for offset in [0u8, 27u8] {
            let sig = sign(&key, &prehash, offset);
            let recovered = recover_secp256k1_public_key(&prehash, &sig).unwrap();
            assert_eq!(&recovered[..], expected.as_bytes());
        }
    }

    #[test]
    fn test_recover_rejects_bad_inputs() {
        let prehash = [1u8; 32];
        assert_eq!(
            recover_secp256k1_public_key(&prehash, &[0u8; 64]),
            Err(CryptoError::InvalidSignatureFormat)
        );

        let mut sig = sign(&signing_key(), &prehash, 27);
        sig[64] = 5;
        assert_eq!(
            recover_secp256k1_public_key(&prehash, &sig),
            Err(CryptoError::InvalidRecoveryId(5))
        );
    }

    #[test]
    fn test_decode_hex_signature() {
        assert_eq!(decode_hex_signature("0x0a0b").unwrap(), vec![10, 11]);
        assert!(decode_hex_signature("0xzz").is_err());
    }
}
