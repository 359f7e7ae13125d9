//! # Outbound Ports
//!
//! Wallet-side dependencies: an injected EIP-1193 provider and a WebAuthn
//! authenticator. Both come with in-memory implementations for tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use k256::ecdsa::SigningKey as Secp256k1SigningKey;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature as P256Signature, SigningKey as P256SigningKey};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_crypto::{
    eth_hash_message, key_hash_from_credential_id, key_hash_from_public_key, keccak256, sha256, TypedData,
};
use shared_types::{Addr, KeyHash};

use crate::domain::errors::ConnectorError;

/// Injected browser-wallet provider (`window.ethereum`-style).
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// `request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ConnectorError>;
}

/// Assertion returned by a WebAuthn `get` ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnAssertion {
    pub credential_id: Vec<u8>,
    /// ASN.1 DER secp256r1 signature over `authenticator_data ∥ sha256(client_data_json)`.
    pub signature: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
}

/// Credential returned by a WebAuthn `create` ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnCredential {
    pub credential_id: Vec<u8>,
    /// SEC1 compressed secp256r1 public key.
    pub public_key: Vec<u8>,
}

/// Platform authenticator driving WebAuthn ceremonies.
#[async_trait]
pub trait WebAuthnAuthenticator: Send + Sync {
    async fn get_assertion(&self, rp_id: &str, challenge: &[u8]) -> Result<WebAuthnAssertion, ConnectorError>;

    async fn create_credential(
        &self,
        rp_id: &str,
        user_name: &str,
        challenge: &[u8],
    ) -> Result<WebAuthnCredential, ConnectorError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Browser wallet backed by one secp256k1 key.
pub struct MockEip1193Wallet {
    key: Secp256k1SigningKey,
    /// Reject every request as if the user closed the popup.
    pub reject: AtomicBool,
    /// Methods in call order.
    pub calls: Mutex<Vec<String>>,
}

impl MockEip1193Wallet {
    pub fn new(secret: &[u8; 32]) -> Result<Self, ConnectorError> {
        let key = Secp256k1SigningKey::from_bytes(secret.into())
            .map_err(|e| ConnectorError::Provider(e.to_string()))?;
        Ok(Self {
            key,
            reject: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> Vec<u8> {
        self.key.verifying_key().to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn key_hash(&self) -> KeyHash {
        key_hash_from_public_key(&self.public_key())
    }

    /// Ethereum address of the controlling key.
    pub fn controller_address(&self) -> Addr {
        let uncompressed = self.key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&uncompressed.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);
        Addr(address)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Value, ConnectorError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| ConnectorError::Provider(e.to_string()))?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Ok(json!(format!("0x{}", hex::encode(bytes))))
    }

    fn string_param(params: &Value, index: usize) -> Result<&str, ConnectorError> {
        params[index]
            .as_str()
            .ok_or_else(|| ConnectorError::InvalidPayload(format!("param {index} must be a string")))
    }
}

#[async_trait]
impl Eip1193Provider for MockEip1193Wallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ConnectorError> {
        self.calls.lock().push(method.to_string());
        if self.reject.load(Ordering::SeqCst) {
            return Err(ConnectorError::Provider("User rejected the request.".to_string()));
        }

        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!([self.controller_address()])),
            "personal_sign" => {
                let message = Self::string_param(&params, 0)?;
                self.sign_digest(&eth_hash_message(message.as_bytes()))
            }
            "eth_signTypedData_v4" => {
                let document = Self::string_param(&params, 1)?;
                let typed: TypedData = serde_json::from_str(document)
                    .map_err(|e| ConnectorError::InvalidPayload(e.to_string()))?;
                self.sign_digest(&typed.hash()?)
            }
            other => Err(ConnectorError::Provider(format!("method {other} not supported"))),
        }
    }
}

/// Platform authenticator holding one P-256 credential.
pub struct MockAuthenticator {
    key: P256SigningKey,
    credential_id: Vec<u8>,
    counter: AtomicU32,
    /// Fail ceremonies as if the user cancelled.
    pub cancel: AtomicBool,
}

impl MockAuthenticator {
    pub fn new(secret: &[u8; 32], credential_id: impl Into<Vec<u8>>) -> Result<Self, ConnectorError> {
        let key =
            P256SigningKey::from_bytes(secret.into()).map_err(|e| ConnectorError::Provider(e.to_string()))?;
        Ok(Self {
            key,
            credential_id: credential_id.into(),
            counter: AtomicU32::new(0),
            cancel: AtomicBool::new(false),
        })
    }

    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    pub fn key_hash(&self) -> KeyHash {
        key_hash_from_credential_id(&self.credential_id)
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> Vec<u8> {
        self.key.verifying_key().to_encoded_point(true).as_bytes().to_vec()
    }

    fn check_cancelled(&self) -> Result<(), ConnectorError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(ConnectorError::Provider("The operation either timed out or was not allowed.".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WebAuthnAuthenticator for MockAuthenticator {
    async fn get_assertion(&self, rp_id: &str, challenge: &[u8]) -> Result<WebAuthnAssertion, ConnectorError> {
        self.check_cancelled()?;

        let client_data_json = serde_json::to_vec(&json!({
            "type": "webauthn.get",
            "challenge": URL_SAFE_NO_PAD.encode(challenge),
            "origin": format!("https://{rp_id}"),
            "crossOrigin": false,
        }))
        .map_err(|e| ConnectorError::Provider(e.to_string()))?;

        // rpIdHash ∥ flags (UP | UV) ∥ signCount
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut authenticator_data = sha256(rp_id.as_bytes()).to_vec();
        authenticator_data.push(0x05);
        authenticator_data.extend_from_slice(&count.to_be_bytes());

        let mut signed = authenticator_data.clone();
        signed.extend_from_slice(&sha256(&client_data_json));
        let signature: P256Signature = self.key.sign(&signed);

        Ok(WebAuthnAssertion {
            credential_id: self.credential_id.clone(),
            signature: signature.to_der().as_bytes().to_vec(),
            authenticator_data,
            client_data_json,
        })
    }

    async fn create_credential(
        &self,
        _rp_id: &str,
        _user_name: &str,
        _challenge: &[u8],
    ) -> Result<WebAuthnCredential, ConnectorError> {
        self.check_cancelled()?;
        Ok(WebAuthnCredential {
            credential_id: self.credential_id.clone(),
            public_key: self.public_key(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::VerifyingKey;
    use shared_crypto::recover_secp256k1_public_key;

    #[tokio::test]
    async fn test_wallet_personal_sign_recovers_to_its_key() {
        let wallet = MockEip1193Wallet::new(&[7; 32]).unwrap();
        let signature = wallet.request("personal_sign", json!(["hello", "0x"])).await.unwrap();
        let bytes = shared_crypto::ecdsa::decode_hex_signature(signature.as_str().unwrap()).unwrap();
        let recovered = recover_secp256k1_public_key(&eth_hash_message(b"hello"), &bytes).unwrap();
        assert_eq!(recovered.to_vec(), wallet.public_key());
    }

    #[tokio::test]
    async fn test_wallet_rejects_when_asked() {
        let wallet = MockEip1193Wallet::new(&[7; 32]).unwrap();
        wallet.reject.store(true, Ordering::SeqCst);
        let err = wallet.request("eth_requestAccounts", json!([])).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Provider(_)));
        assert_eq!(wallet.calls(), vec!["eth_requestAccounts".to_string()]);
    }

    #[tokio::test]
    async fn test_assertion_verifies_under_public_key() {
        let authenticator = MockAuthenticator::new(&[9; 32], b"cred-1".to_vec()).unwrap();
        let assertion = authenticator.get_assertion("example.org", b"challenge").await.unwrap();

        let mut signed = assertion.authenticator_data.clone();
        signed.extend_from_slice(&sha256(&assertion.client_data_json));
        let key = VerifyingKey::from_sec1_bytes(&authenticator.public_key()).unwrap();
        let signature = P256Signature::from_der(&assertion.signature).unwrap();
        assert!(key.verify(&signed, &signature).is_ok());

        let client_data: Value = serde_json::from_slice(&assertion.client_data_json).unwrap();
        assert_eq!(client_data["challenge"], URL_SAFE_NO_PAD.encode(b"challenge"));
    }
}
