//! # Passkey Connector
//!
//! WebAuthn passkeys. The key fingerprint is the sha256 of the credential
//! id; assertions are converted from DER to raw low-S `r ∥ s`.

use std::sync::Arc;

use async_trait::async_trait;
use ck_01_chain_client::{ChainApi, Key};
use serde_json::Value;
use shared_crypto::{canonical_json, key_hash_from_credential_id, secp256r1_signature_from_der, sha256};
use shared_types::{
    Account, Binary, ChainId, ConnectorInfo, ConnectorKind, Credential, KeyHash, PasskeySignature, Signature,
    Username,
};
use tracing::debug;

use crate::context::ConnectorContext;
use crate::domain::entities::{ConnectParameters, NewKey, SignDoc, SignedPayload};
use crate::domain::errors::ConnectorError;
use crate::domain::session::{Session, SessionState};
use crate::ports::inbound::WalletConnector;
use crate::ports::outbound::{WebAuthnAssertion, WebAuthnAuthenticator};

pub const PASSKEY_CONNECTOR_ID: &str = "passkey";

pub struct PasskeyConnector {
    info: ConnectorInfo,
    icon: Option<String>,
    authenticator: Arc<dyn WebAuthnAuthenticator>,
    ctx: ConnectorContext,
    session: SessionState,
}

impl PasskeyConnector {
    pub fn new(icon: Option<String>, authenticator: Arc<dyn WebAuthnAuthenticator>, ctx: ConnectorContext) -> Self {
        Self {
            info: ConnectorInfo {
                id: PASSKEY_CONNECTOR_ID.to_string(),
                name: "Passkey".to_string(),
                kind: ConnectorKind::Passkey,
                uid: ctx.uid.clone(),
            },
            icon,
            authenticator,
            ctx,
            session: SessionState::new(),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    async fn assert(&self, challenge: &[u8]) -> Result<WebAuthnAssertion, ConnectorError> {
        self.authenticator
            .get_assertion(&self.ctx.config.app_domain, challenge)
            .await
    }

    fn credential(assertion: WebAuthnAssertion) -> Result<Credential, ConnectorError> {
        let sig = secp256r1_signature_from_der(&assertion.signature)?;
        Ok(Credential {
            key_hash: key_hash_from_credential_id(&assertion.credential_id),
            signature: Signature::Passkey(PasskeySignature {
                sig: Binary(sig.to_vec()),
                client_data: Binary(assertion.client_data_json),
                authenticator_data: Binary(assertion.authenticator_data),
            }),
        })
    }
}

#[async_trait]
impl WalletConnector for PasskeyConnector {
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

        let key_hash = match params.key_hash {
            Some(key_hash) => key_hash,
            None => {
                let challenge = match params.challenge {
                    Some(challenge) => challenge.into_bytes(),
                    None => rand::random::<[u8; 32]>().to_vec(),
                };
                let assertion = self.assert(&challenge).await?;
                key_hash_from_credential_id(&assertion.credential_id)
            }
        };
        self.ctx
            .ensure_registered_key(&client, &params.username, &key_hash)
            .await?;

        let accounts = client.accounts_by_username(&params.username).await?;
        self.ctx.complete_connect(
            &self.session,
            ticket,
            Session {
                username: params.username,
                chain_id: params.chain_id,
                key_hash: Some(key_hash),
            },
            accounts,
        )
    }

    async fn disconnect(&self) -> Result<(), ConnectorError> {
        self.ctx.complete_disconnect(&self.session);
        Ok(())
    }

    async fn get_accounts(&self) -> Result<Vec<Account>, ConnectorError> {
        let session = self
            .session
            .current()
            .ok_or_else(|| ConnectorError::NotConnected(self.info.id.clone()))?;
        let client = self.ctx.client(&session.chain_id)?;
        Ok(client.accounts_by_username(&session.username).await?)
    }

    async fn get_key_hash(&self) -> Result<KeyHash, ConnectorError> {
        let assertion = self.assert(&rand::random::<[u8; 32]>()).await?;
        Ok(key_hash_from_credential_id(&assertion.credential_id))
    }

    async fn create_new_key(&self, challenge: Option<&str>) -> Result<NewKey, ConnectorError> {
        let challenge = challenge.unwrap_or(self.ctx.config.default_challenge.as_str());
        let user_name = self
            .session
            .current()
            .map(|s| s.username.to_string())
            .unwrap_or_else(|| self.ctx.config.app_domain.clone());

        let credential = self
            .authenticator
            .create_credential(&self.ctx.config.app_domain, &user_name, challenge.as_bytes())
            .await?;

        Ok(NewKey {
            key: Key::Secp256r1(Binary(credential.public_key)),
            key_hash: key_hash_from_credential_id(&credential.credential_id),
        })
    }

    async fn sign_tx(&self, doc: &SignDoc) -> Result<Credential, ConnectorError> {
        let assertion = self.assert(doc.sign_bytes.as_bytes()).await?;
        let credential = Self::credential(assertion)?;
        debug!(uid = %self.info.uid, key_hash = %credential.key_hash, "Transaction signed with passkey");
        Ok(credential)
    }

    async fn sign_arbitrary(&self, payload: &Value) -> Result<SignedPayload, ConnectorError> {
        let challenge = sha256(&canonical_json(payload)?);
        let assertion = self.assert(&challenge).await?;
        Ok(SignedPayload {
            credential: Self::credential(assertion)?,
            payload: payload.clone(),
        })
    }

    fn on_connect(&self, chain_id: &ChainId, username: &Username) {
        self.session.reseat(username.clone(), chain_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockAuthenticator;
    use crate::test_support::Fixture;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use shared_bus::ConnectorEvent;
    use shared_types::Hash256;
    use std::sync::atomic::Ordering;

    fn authenticator() -> Arc<MockAuthenticator> {
        Arc::new(MockAuthenticator::new(&[9; 32], b"credential-1".to_vec()).unwrap())
    }

    fn connector(fixture: &Fixture, authenticator: Arc<MockAuthenticator>) -> PasskeyConnector {
        PasskeyConnector::new(None, authenticator, fixture.context("c-passkey"))
    }

    #[tokio::test]
    async fn test_connect_with_registered_passkey() {
        let fixture = Fixture::new();
        let authenticator = authenticator();
        fixture.register_user(
            "alice",
            authenticator.key_hash(),
            Key::Secp256r1(Binary(authenticator.public_key())),
        );
        let connector = connector(&fixture, authenticator.clone());

        connector
            .connect(ConnectParameters::new("alice", "dev-1").with_challenge("login"))
            .await
            .unwrap();

        assert!(connector.is_authorized());
        assert_eq!(connector.info().id, "passkey");
        let events = fixture.inbox.drain();
        assert!(matches!(&events[0].event, ConnectorEvent::Connect(p) if p.key_hash == Some(authenticator.key_hash())));
    }

    #[tokio::test]
    async fn test_connect_with_key_hash_skips_ceremony() {
        let fixture = Fixture::new();
        let authenticator = authenticator();
        authenticator.cancel.store(true, Ordering::SeqCst);
        fixture.register_user("alice", authenticator.key_hash(), Key::Secp256r1(Binary(vec![2; 33])));
        let connector = connector(&fixture, authenticator.clone());

        connector
            .connect(ConnectParameters::new("alice", "dev-1").with_key_hash(authenticator.key_hash()))
            .await
            .unwrap();
        assert!(connector.is_authorized());

        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1").with_key_hash(Hash256([3; 32])))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::NotAuthorized));
    }

    #[tokio::test]
    async fn test_sign_tx_challenge_is_sign_bytes() {
        let fixture = Fixture::new();
        let authenticator = authenticator();
        let connector = connector(&fixture, authenticator.clone());
        let doc = SignDoc {
            sender: shared_types::Addr([0x10; 20]),
            msgs: vec![],
            chain_id: "dev-1".into(),
            sequence: 0,
            sign_bytes: Hash256(sha256(b"tx")),
        };

        let credential = connector.sign_tx(&doc).await.unwrap();
        assert_eq!(credential.key_hash, authenticator.key_hash());
        let Signature::Passkey(passkey) = credential.signature else {
            panic!("expected passkey signature");
        };
        assert_eq!(passkey.sig.0.len(), 64);
        let client_data: Value = serde_json::from_slice(&passkey.client_data.0).unwrap();
        assert_eq!(client_data["challenge"], URL_SAFE_NO_PAD.encode(doc.sign_bytes.as_bytes()));
    }

    #[tokio::test]
    async fn test_switch_chain_unsupported() {
        let fixture = Fixture::new();
        let connector = connector(&fixture, authenticator());
        let err = connector.switch_chain(&"dev-1".into()).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Unsupported("switch_chain")));
    }

    #[tokio::test]
    async fn test_cancelled_ceremony_emits_nothing() {
        let fixture = Fixture::new();
        let authenticator = authenticator();
        authenticator.cancel.store(true, Ordering::SeqCst);
        let connector = connector(&fixture, authenticator);

        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1").with_challenge("login"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Provider(_)));
        assert!(fixture.inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_connect_without_challenge_runs_ceremony() {
        let fixture = Fixture::new();
        let authenticator = authenticator();
        fixture.register_user(
            "alice",
            authenticator.key_hash(),
            Key::Secp256r1(Binary(authenticator.public_key())),
        );
        let connector = connector(&fixture, authenticator.clone());

        connector
            .connect(ConnectParameters::new("alice", "dev-1"))
            .await
            .unwrap();
        assert!(connector.is_authorized());
        let events = fixture.inbox.drain();
        assert!(matches!(&events[0].event, ConnectorEvent::Connect(p) if p.key_hash == Some(authenticator.key_hash())));

        connector.disconnect().await.unwrap();
        fixture.inbox.drain();
        authenticator.cancel.store(true, Ordering::SeqCst);
        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Provider(_)));
        assert!(!connector.is_authorized());
        assert!(fixture.inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_connect_without_challenge_checks_registered_keys() {
        let fixture = Fixture::new();
        fixture.register_user("alice", Hash256([1; 32]), Key::Secp256r1(Binary(vec![2; 33])));
        let connector = connector(&fixture, authenticator());

        let err = connector
            .connect(ConnectParameters::new("alice", "dev-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectorError::NotAuthorized));
        assert!(fixture.inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_create_new_key() {
        let fixture = Fixture::new();
        let authenticator = authenticator();
        let connector = connector(&fixture, authenticator.clone());
        let new_key = connector.create_new_key(Some("register")).await.unwrap();
        assert_eq!(new_key.key_hash, authenticator.key_hash());
        assert_eq!(new_key.key, Key::Secp256r1(Binary(authenticator.public_key())));
    }
}
