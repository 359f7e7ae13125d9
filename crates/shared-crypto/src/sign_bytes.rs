//! # Sign Bytes
//!
//! The digest every credential signs:
//!
//! ```text
//! sha256( canonical_json(msgs) ∥ sender_bytes ∥ utf8(chain_id) ∥ u32_be(sequence) )
//! ```
//!
//! `sender_bytes` are the 20 raw address bytes, without the `0x` prefix.

use serde::Serialize;
use shared_types::{Addr, ChainId, Hash256, Message};

use crate::errors::CryptoError;
use crate::hashing::sha256;

/// Compact JSON with object keys sorted.
///
/// Going through `serde_json::Value` sorts keys because its map type is
/// ordered.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    let value = serde_json::to_value(value).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| CryptoError::Serialization(e.to_string()))
}

/// Compute the sign bytes of a transaction.
pub fn sign_bytes(
    msgs: &[Message],
    sender: &Addr,
    chain_id: &ChainId,
    sequence: u32,
) -> Result<Hash256, CryptoError> {
    let mut preimage = canonical_json(msgs)?;
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(chain_id.as_str().as_bytes());
    preimage.extend_from_slice(&sequence.to_be_bytes());
    Ok(Hash256(sha256(&preimage)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Coins;

    fn transfer() -> Vec<Message> {
        vec![Message::transfer(Addr([0x22; 20]), Coins::one("uusdc", 100))]
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let json = canonical_json(&transfer()).unwrap();
        assert_eq!(
            String::from_utf8(json).unwrap(),
            r#"[{"transfer":{"coins":{"uusdc":"100"},"to":"0x2222222222222222222222222222222222222222"}}]"#
        );
    }

    #[test]
    fn test_sign_bytes_regression_vector() {
        let digest = sign_bytes(&transfer(), &Addr([0x11; 20]), &ChainId::new("dev-1"), 0).unwrap();
        assert_eq!(
            digest.to_string(),
            "8D29971153DAB272B15551559C6D680011D2841B06F214B719880ADD6807DFE0"
        );
    }

    #[test]
    fn test_sign_bytes_binds_every_field() {
        let base = sign_bytes(&transfer(), &Addr([0x11; 20]), &ChainId::new("dev-1"), 0).unwrap();
        let other_seq = sign_bytes(&transfer(), &Addr([0x11; 20]), &ChainId::new("dev-1"), 1).unwrap();
        let other_chain = sign_bytes(&transfer(), &Addr([0x11; 20]), &ChainId::new("dev-2"), 0).unwrap();
        let other_sender = sign_bytes(&transfer(), &Addr([0x12; 20]), &ChainId::new("dev-1"), 0).unwrap();
        assert_ne!(base, other_seq);
        assert_ne!(base, other_chain);
        assert_ne!(base, other_sender);
    }
}
