//! # Transaction Envelope
//!
//! Messages, credentials and the signed transaction submitted through
//! `broadcast_tx_sync`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

use crate::entities::{Addr, Binary, Hash256, KeyHash, Username};

/// Token amounts keyed by denomination.
///
/// Amounts are encoded as decimal strings on the wire.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(#[serde_as(as = "BTreeMap<_, DisplayFromStr>")] pub BTreeMap<String, u128>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-denomination coins.
    pub fn one(denom: impl Into<String>, amount: u128) -> Self {
        let mut coins = BTreeMap::new();
        coins.insert(denom.into(), amount);
        Self(coins)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A message carried by a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    /// Update chain configuration.
    Configure { new_cfg: Value },
    /// Send coins to an address.
    Transfer { to: Addr, coins: Coins },
    /// Upload contract code.
    Upload { code: Binary },
    /// Instantiate a contract from uploaded code.
    Instantiate {
        code_hash: Hash256,
        msg: Value,
        salt: Binary,
        label: Option<String>,
        admin: Option<Addr>,
        funds: Coins,
    },
    /// Execute a contract.
    Execute {
        contract: Addr,
        msg: Value,
        funds: Coins,
    },
    /// Migrate a contract to new code.
    Migrate {
        contract: Addr,
        new_code_hash: Hash256,
        msg: Value,
    },
}

impl Message {
    pub fn transfer(to: Addr, coins: Coins) -> Self {
        Self::Transfer { to, coins }
    }

    pub fn execute(contract: Addr, msg: Value, funds: Coins) -> Self {
        Self::Execute {
            contract,
            msg,
            funds,
        }
    }
}

/// Signing metadata bound into every transaction.
///
/// Pins the signing key and the sequence so the envelope cannot be
/// replayed under another key or at another position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub username: Username,
    pub key_hash: KeyHash,
    pub sequence: u32,
}

/// EIP-712 signature produced by a browser wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Signature {
    /// `r ∥ s`, 64 bytes.
    pub sig: Binary,
    /// UTF-8 JSON of the typed data document that was signed.
    pub typed_data: Binary,
}

/// WebAuthn assertion produced by a passkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeySignature {
    /// Raw `r ∥ s` secp256r1 signature, 64 bytes.
    pub sig: Binary,
    pub client_data: Binary,
    pub authenticator_data: Binary,
}

/// Signature variants understood by the account contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signature {
    Eip712(Eip712Signature),
    Passkey(PasskeySignature),
    Secp256k1(Binary),
}

/// Signature plus the fingerprint of the key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub key_hash: KeyHash,
    pub signature: Signature,
}

/// Messages and sender of a not-yet-signed transaction.
///
/// This is the body sent to `simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub sender: Addr,
    pub msgs: Vec<Message>,
}

/// The final signed transaction envelope.
///
/// Created fresh for every signing call.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    pub sender: Addr,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: u64,
    pub msgs: Vec<Message>,
    pub data: Metadata,
    pub credential: Credential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coins_amounts_are_strings() {
        let value = serde_json::to_value(Coins::one("uusdc", 250)).unwrap();
        assert_eq!(value, json!({ "uusdc": "250" }));
    }

    #[test]
    fn test_message_is_externally_tagged() {
        let msg = Message::transfer(Addr([1; 20]), Coins::one("uusdc", 1));
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("transfer").is_some());
        assert_eq!(value["transfer"]["coins"]["uusdc"], "1");
    }

    #[test]
    fn test_signature_variant_keys() {
        let sig = Signature::Passkey(PasskeySignature {
            sig: Binary(vec![1; 64]),
            client_data: Binary(b"{}".to_vec()),
            authenticator_data: Binary(vec![0; 37]),
        });
        let value = serde_json::to_value(&sig).unwrap();
        assert!(value["passkey"]["client_data"].is_string());
    }

    #[test]
    fn test_tx_gas_limit_is_string() {
        let tx = Tx {
            sender: Addr([2; 20]),
            gas_limit: 1_000_000,
            msgs: vec![],
            data: Metadata {
                username: Username::new("alice"),
                key_hash: Hash256::ZERO,
                sequence: 3,
            },
            credential: Credential {
                key_hash: Hash256::ZERO,
                signature: Signature::Secp256k1(Binary(vec![0; 64])),
            },
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["gas_limit"], "1000000");
        assert_eq!(value["data"]["sequence"], 3);
        let back: Tx = serde_json::from_value(value).unwrap();
        assert_eq!(back, tx);
    }
}
