//! # EIP-1193 Connector
//!
//! Drives an injected browser wallet. Key control is proven with
//! `personal_sign`; the key fingerprint is the sha256 of the public key
//! recovered from that signature. Transactions and off-chain payloads are
//! signed as EIP-712 typed data.

use std::sync::Arc;

use async_trait::async_trait;
use ck_01_chain_client::{ChainApi, Key};
use serde_json::{json, Value};
use shared_bus::ChangePayload;
use shared_crypto::ecdsa::decode_hex_signature;
use shared_crypto::{eth_hash_message, key_hash_from_public_key, recover_secp256k1_public_key, TxTypedData, TypedData};
use shared_types::{
    Account, Binary, ChainId, ConnectorInfo, ConnectorKind, Credential, Eip712Signature, KeyHash, Signature,
    Username,
};
use tracing::{debug, info};

use crate::context::ConnectorContext;
use crate::domain::entities::{ConnectParameters, NewKey, SignDoc, SignedPayload};
use crate::domain::errors::ConnectorError;
use crate::domain::session::{Session, SessionState};
use crate::ports::inbound::WalletConnector;
use crate::ports::outbound::Eip1193Provider;

pub struct Eip1193Connector {
    info: ConnectorInfo,
    icon: Option<String>,
    provider: Option<Arc<dyn Eip1193Provider>>,
    ctx: ConnectorContext,
    session: SessionState,
}

impl Eip1193Connector {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: Option<String>,
        provider: Option<Arc<dyn Eip1193Provider>>,
        ctx: ConnectorContext,
    ) -> Self {
        Self {
            info: ConnectorInfo {
                id: id.into(),
                name: name.into(),
                kind: ConnectorKind::Eip1193,
                uid: ctx.uid.clone(),
            },
            icon,
            provider,
            ctx,
            session: SessionState::new(),
        }
    }

    /// The seated session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    fn provider(&self) -> Result<&Arc<dyn Eip1193Provider>, ConnectorError> {
        self.provider
            .as_ref()
            .ok_or_else(|| ConnectorError::ProviderNotDetected(self.info.name.clone()))
    }

    async fn controller_address(&self, provider: &Arc<dyn Eip1193Provider>) -> Result<String, ConnectorError> {
        let accounts = provider.request("eth_requestAccounts", json!([])).await?;
        accounts[0]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ConnectorError::Provider("wallet returned no accounts".to_string()))
    }

    /// `personal_sign` the challenge and recover the signing key.
    async fn personal_sign(&self, message: &str) -> Result<[u8; 33], ConnectorError> {
        let provider = self.provider()?;
        let controller = self.controller_address(provider).await?;
        Self::personal_sign_as(provider, &controller, message).await
    }

    async fn personal_sign_as(
        provider: &Arc<dyn Eip1193Provider>,
        controller: &str,
        message: &str,
    ) -> Result<[u8; 33], ConnectorError> {
        let response = provider
            .request("personal_sign", json!([message, controller]))
            .await?;
        let signature = decode_hex_signature(signature_str(&response)?)?;
        Ok(recover_secp256k1_public_key(&eth_hash_message(message.as_bytes()), &signature)?)
    }

    /// `eth_signTypedData_v4` the document and build the credential from
    /// the key recovered over `digest`.
    async fn sign_typed_data(&self, document: String, digest: &[u8; 32]) -> Result<Credential, ConnectorError> {
        let provider = self.provider()?;
        let controller = self.controller_address(provider).await?;

        let response = provider
            .request("eth_signTypedData_v4", json!([controller, document]))
            .await?;
        let signature = decode_hex_signature(signature_str(&response)?)?;
        let public_key = recover_secp256k1_public_key(digest, &signature)?;

        Ok(Credential {
            key_hash: key_hash_from_public_key(&public_key),
            signature: Signature::Eip712(Eip712Signature {
                sig: Binary(signature[..64].to_vec()),
                typed_data: Binary(document.into_bytes()),
            }),
        })
    }

    fn seated(&self) -> Result<Session, ConnectorError> {
        self.session
            .current()
            .ok_or_else(|| ConnectorError::NotConnected(self.info.id.clone()))
    }
}

fn signature_str(response: &Value) -> Result<&str, ConnectorError> {
    response
        .as_str()
        .ok_or_else(|| ConnectorError::Provider("signature must be a hex string".to_string()))
}

#[async_trait]
impl WalletConnector for Eip1193Connector {
    fn info(&self) -> &ConnectorInfo {
        &self.info
    }

    fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    fn is_authorized(&self) -> bool {
        self.session.is_authorized()
    }

    async fn connect(&self, params: ConnectParameters) -> Result<(), ConnectorError> {
        let ticket = self.ctx.emitter.begin_attempt();
        let client = self.ctx.client(&params.chain_id)?;
        let provider = self.provider()?;
        let controller = self.controller_address(provider).await?;

        let key_hash = match (params.key_hash, params.challenge.as_deref()) {
            (Some(key_hash), _) => Some(key_hash),
            (None, Some(challenge)) => {
                let public_key = Self::personal_sign_as(provider, &controller, challenge).await?;
                Some(key_hash_from_public_key(&public_key))
            }
            (None, None) => None,
        };

        if let Some(key_hash) = &key_hash {
            self.ctx
                .ensure_registered_key(&client, &params.username, key_hash)
                .await?;
        }

        let accounts = client.accounts_by_username(&params.username).await?;
        self.ctx.complete_connect(
            &self.session,
            ticket,
            Session {
                username: params.username,
                chain_id: params.chain_id,
                key_hash,
            },
            accounts,
        )
    }

    async fn disconnect(&self) -> Result<(), ConnectorError> {
        self.ctx.complete_disconnect(&self.session);
        Ok(())
    }

    async fn get_accounts(&self) -> Result<Vec<Account>, ConnectorError> {
        let session = self.seated()?;
        let client = self.ctx.client(&session.chain_id)?;
        Ok(client.accounts_by_username(&session.username).await?)
    }

    async fn get_key_hash(&self) -> Result<KeyHash, ConnectorError> {
        let challenge = hex::encode(rand::random::<[u8; 32]>());
        let public_key = self.personal_sign(&challenge).await?;
        Ok(key_hash_from_public_key(&public_key))
    }

    async fn create_new_key(&self, challenge: Option<&str>) -> Result<NewKey, ConnectorError> {
        let challenge = challenge.unwrap_or(self.ctx.config.default_challenge.as_str());
        let public_key = self.personal_sign(challenge).await?;
        Ok(NewKey {
            key: Key::Secp256k1(Binary(public_key.to_vec())),
            key_hash: key_hash_from_public_key(&public_key),
        })
    }

    async fn sign_tx(&self, doc: &SignDoc) -> Result<Credential, ConnectorError> {
        let typed = TxTypedData::new(
            &self.ctx.config.app_domain,
            doc.sender,
            doc.chain_id.clone(),
            doc.sequence,
            &doc.sign_bytes,
        );
        let document =
            serde_json::to_string(&typed).map_err(|e| ConnectorError::InvalidPayload(e.to_string()))?;

        let credential = self.sign_typed_data(document, &typed.hash()?).await?;
        debug!(uid = %self.info.uid, key_hash = %credential.key_hash, "Transaction signed with EIP-712");
        Ok(credential)
    }

    async fn sign_arbitrary(&self, payload: &Value) -> Result<SignedPayload, ConnectorError> {
        let typed = TypedData::arbitrary(&self.ctx.config.app_domain, payload)?;
        let document =
            serde_json::to_string(&typed).map_err(|e| ConnectorError::InvalidPayload(e.to_string()))?;

        Ok(SignedPayload {
            credential: self.sign_typed_data(document, &typed.hash()?).await?,
            payload: payload.clone(),
        })
    }

    fn on_connect(&self, chain_id: &ChainId, username: &Username) {
        self.session.reseat(username.clone(), chain_id.clone());
    }

    async fn switch_chain(&self, chain_id: &ChainId) -> Result<(), ConnectorError> {
        if !self.ctx.clients.is_configured(chain_id) {
            return Err(ConnectorError::ChainNotConfigured(chain_id.clone()));
        }
        if !self.session.switch_chain(chain_id.clone()) {
            return Err(ConnectorError::NotConnected(self.info.id.clone()));
        }

        info!(uid = %self.info.uid, chain_id = %chain_id, "Switched chain");
        self.ctx.emitter.emit_change(ChangePayload {
            chain_id: Some(chain_id.clone()),
            ..Default::default()
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockEip1193Wallet;
    use crate::test_support::Fixture;
    use shared_bus::ConnectorEvent;
    use shared_crypto::sha256;
    use shared_types::{Addr, Hash256, Uid};

    fn connector(fixture: &Fixture, wallet: Option<Arc<MockEip1193Wallet>>) -> Eip1193Connector {
        let provider = wallet.map(|w| w as Arc<dyn Eip1193Provider>);
        Eip1193Connector::new("metamask", "MetaMask", None, provider, fixture.context("c-metamask"))
    }

    fn wallet() -> Arc<MockEip1193Wallet> {
        Arc::new(MockEip1193Wallet::new(&[7; 32]).unwrap())
    }

    #[tokio::test]
    async fn test_connect_with_challenge_emits_connect() {
        let fixture = Fixture::new();
        let wallet = wallet();
        fixture.register_user("alice", wallet.key_hash(), Key::Secp256k1(Binary(wallet.public_key())));
        let connector = connector(&fixture, Some(wallet.clone()));

        connector
            .connect(ConnectParameters::new("alice", "dev-1").with_challenge("prove it"))
            .await
            .unwrap();

        assert!(connector.is_authorized());
        let events = fixture.inbox.drain();
        assert_eq!(events.len(), 1);
        match &events[0].event {
            ConnectorEvent::Connect(payload) => {
                assert_eq!(payload.key_hash, Some(wallet.key_hash()));
                assert_eq!(payload.accounts.len(), 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregistered_key_is_not_authorized() {
        let fixture = Fixture::new();
        fixture.register_user("alice", Hash256([1; 32]), Key::Ethereum(Addr([1; 20])));
        let connector = connector(&fixture, Some(wallet()));

        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1").with_challenge("prove it"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectorError::NotAuthorized));
        assert!(!connector.is_authorized());
        assert!(fixture.inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_missing_provider_is_reported() {
        let fixture = Fixture::new();
        let connector = connector(&fixture, None);
        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "MetaMask not detected");
    }

    #[tokio::test]
    async fn test_unconfigured_chain() {
        let fixture = Fixture::new();
        let connector = connector(&fixture, Some(wallet()));
        let err = connector
            .connect(ConnectParameters::new("alice", "nope-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::ChainNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let fixture = Fixture::new();
        let connector = connector(&fixture, Some(wallet()));
        connector.disconnect().await.unwrap();
        connector.disconnect().await.unwrap();
        fixture.inbox.detach(&Uid::new("c-metamask"));
        connector.disconnect().await.unwrap();
        assert!(!connector.is_authorized());
    }

    #[tokio::test]
    async fn test_sign_tx_produces_eip712_credential() {
        let fixture = Fixture::new();
        let wallet = wallet();
        let connector = connector(&fixture, Some(wallet.clone()));
        let doc = SignDoc {
            sender: Addr([0x10; 20]),
            msgs: vec![],
            chain_id: "dev-1".into(),
            sequence: 4,
            sign_bytes: Hash256(sha256(b"doc")),
        };

        let credential = connector.sign_tx(&doc).await.unwrap();
        assert_eq!(credential.key_hash, wallet.key_hash());
        let Signature::Eip712(eip712) = credential.signature else {
            panic!("expected EIP-712 signature");
        };
        assert_eq!(eip712.sig.0.len(), 64);
        let typed: TxTypedData = serde_json::from_slice(&eip712.typed_data.0).unwrap();
        assert_eq!(typed.sign_bytes().unwrap(), doc.sign_bytes.0);
        assert_eq!(typed.domain.name, "connect-kit.test");
        assert_eq!(typed.message.sequence, 4);
    }

    #[tokio::test]
    async fn test_create_new_key_uses_default_challenge() {
        let fixture = Fixture::new();
        let wallet = wallet();
        let connector = connector(&fixture, Some(wallet.clone()));
        let new_key = connector.create_new_key(None).await.unwrap();
        assert_eq!(new_key.key_hash, wallet.key_hash());
        assert_eq!(new_key.key, Key::Secp256k1(Binary(wallet.public_key())));
        assert_eq!(connector.get_key_hash().await.unwrap(), wallet.key_hash());
    }

    #[tokio::test]
    async fn test_switch_chain_emits_change() {
        let fixture = Fixture::new();
        let connector = connector(&fixture, Some(wallet()));
        assert!(matches!(
            connector.switch_chain(&"dev-1".into()).await,
            Err(ConnectorError::NotConnected(_))
        ));

        connector.on_connect(&"dev-1".into(), &"alice".into());
        connector.switch_chain(&"dev-1".into()).await.unwrap();
        let events = fixture.inbox.drain();
        assert!(matches!(
            &events[0].event,
            ConnectorEvent::Change(ChangePayload { chain_id: Some(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_without_challenge_requests_accounts() {
        let fixture = Fixture::new();
        let wallet = wallet();
        let connector = connector(&fixture, Some(wallet.clone()));

        connector
            .connect(ConnectParameters::new("alice", "dev-1"))
            .await
            .unwrap();

        assert_eq!(wallet.calls(), vec!["eth_requestAccounts".to_string()]);
        assert!(!connector.is_authorized());
        assert_eq!(fixture.inbox.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_account_request_fails_connect() {
        let fixture = Fixture::new();
        let wallet = wallet();
        wallet.reject.store(true, std::sync::atomic::Ordering::SeqCst);
        let connector = connector(&fixture, Some(wallet.clone()));

        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectorError::Provider(_)));
        assert_eq!(wallet.calls(), vec!["eth_requestAccounts".to_string()]);
        assert!(connector.session().is_none());
        assert!(fixture.inbox.drain().is_empty());
    }

    fn greeting() -> Value {
        json!({
            "types": { "Greeting": [{ "name": "text", "type": "string" }] },
            "primaryType": "Greeting",
            "message": { "text": "gm" }
        })
    }

    #[tokio::test]
    async fn test_sign_arbitrary_produces_eip712_credential() {
        let fixture = Fixture::new();
        let wallet = wallet();
        let connector = connector(&fixture, Some(wallet.clone()));

        let signed = connector.sign_arbitrary(&greeting()).await.unwrap();

        assert_eq!(signed.payload, greeting());
        assert_eq!(signed.credential.key_hash, wallet.key_hash());
        let Signature::Eip712(eip712) = signed.credential.signature else {
            panic!("expected EIP-712 signature");
        };
        let typed: TypedData = serde_json::from_slice(&eip712.typed_data.0).unwrap();
        assert_eq!(typed.primary_type, "Greeting");
        assert_eq!(typed.domain["name"], "connect-kit.test");
        assert_eq!(wallet.calls().last().unwrap(), "eth_signTypedData_v4");
    }

    #[tokio::test]
    async fn test_sign_arbitrary_requires_typed_data() {
        let fixture = Fixture::new();
        let wallet = wallet();
        let connector = connector(&fixture, Some(wallet.clone()));

        let err = connector
            .sign_arbitrary(&json!({ "b": 1, "a": "x" }))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Typed data required");
        assert!(wallet.calls().is_empty());
    }
}
