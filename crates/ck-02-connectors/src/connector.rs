//! # Connector Variants
//!
//! The closed set of connector kinds. `ConnectorSpec` is the
//! configuration-time description; `Connector` is the live instance the
//! registry builds from it once a uid and an emitter exist.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Account, ChainId, ConnectorInfo, ConnectorKind, Credential, KeyHash, Uid, Username};

use crate::adapters::eip1193::Eip1193Connector;
use crate::adapters::passkey::{PasskeyConnector, PASSKEY_CONNECTOR_ID};
use crate::context::ConnectorContext;
use crate::domain::entities::{ConnectParameters, NewKey, SignDoc, SignedPayload};
use crate::domain::errors::ConnectorError;
use crate::ports::inbound::WalletConnector;
use crate::ports::outbound::{Eip1193Provider, WebAuthnAuthenticator};

/// A connector to be built by the registry.
#[derive(Clone)]
pub enum ConnectorSpec {
    Eip1193 {
        id: String,
        name: String,
        icon: Option<String>,
        /// `None` when no wallet is injected; `connect` then fails with
        /// `ProviderNotDetected`.
        provider: Option<Arc<dyn Eip1193Provider>>,
    },
    Passkey {
        icon: Option<String>,
        authenticator: Arc<dyn WebAuthnAuthenticator>,
    },
}

impl fmt::Debug for ConnectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorSpec")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}

impl ConnectorSpec {
    pub fn eip1193(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: Option<Arc<dyn Eip1193Provider>>,
    ) -> Self {
        Self::Eip1193 {
            id: id.into(),
            name: name.into(),
            icon: None,
            provider,
        }
    }

    pub fn passkey(authenticator: Arc<dyn WebAuthnAuthenticator>) -> Self {
        Self::Passkey {
            icon: None,
            authenticator,
        }
    }

    pub fn with_icon(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Eip1193 { icon, .. } | Self::Passkey { icon, .. } => *icon = Some(value.into()),
        }
        self
    }

    /// Stable connector id.
    pub fn id(&self) -> &str {
        match self {
            Self::Eip1193 { id, .. } => id,
            Self::Passkey { .. } => PASSKEY_CONNECTOR_ID,
        }
    }

    pub fn kind(&self) -> ConnectorKind {
        match self {
            Self::Eip1193 { .. } => ConnectorKind::Eip1193,
            Self::Passkey { .. } => ConnectorKind::Passkey,
        }
    }

    pub fn build(self, ctx: ConnectorContext) -> Connector {
        match self {
            Self::Eip1193 {
                id,
                name,
                icon,
                provider,
            } => Connector::Eip1193(Eip1193Connector::new(id, name, icon, provider, ctx)),
            Self::Passkey { icon, authenticator } => {
                Connector::Passkey(PasskeyConnector::new(icon, authenticator, ctx))
            }
        }
    }
}

/// A live connector.
pub enum Connector {
    Eip1193(Eip1193Connector),
    Passkey(PasskeyConnector),
}

impl Connector {
    fn as_dyn(&self) -> &dyn WalletConnector {
        match self {
            Self::Eip1193(c) => c,
            Self::Passkey(c) => c,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn uid(&self) -> &Uid {
        &self.info().uid
    }

    pub fn kind(&self) -> ConnectorKind {
        self.info().kind
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Connector").field(self.info()).finish()
    }
}

#[async_trait]
impl WalletConnector for Connector {
    fn info(&self) -> &ConnectorInfo {
        self.as_dyn().info()
    }

    fn icon(&self) -> Option<&str> {
        self.as_dyn().icon()
    }

    fn is_authorized(&self) -> bool {
        self.as_dyn().is_authorized()
    }

    async fn connect(&self, params: ConnectParameters) -> Result<(), ConnectorError> {
        self.as_dyn().connect(params).await
    }

    async fn disconnect(&self) -> Result<(), ConnectorError> {
        self.as_dyn().disconnect().await
    }

    async fn get_accounts(&self) -> Result<Vec<Account>, ConnectorError> {
        self.as_dyn().get_accounts().await
    }

    async fn get_key_hash(&self) -> Result<KeyHash, ConnectorError> {
        self.as_dyn().get_key_hash().await
    }

    async fn create_new_key(&self, challenge: Option<&str>) -> Result<NewKey, ConnectorError> {
        self.as_dyn().create_new_key(challenge).await
    }

    async fn sign_tx(&self, doc: &SignDoc) -> Result<Credential, ConnectorError> {
        self.as_dyn().sign_tx(doc).await
    }

    async fn sign_arbitrary(&self, payload: &Value) -> Result<SignedPayload, ConnectorError> {
        self.as_dyn().sign_arbitrary(payload).await
    }

    fn on_connect(&self, chain_id: &ChainId, username: &Username) {
        self.as_dyn().on_connect(chain_id, username)
    }

    async fn switch_chain(&self, chain_id: &ChainId) -> Result<(), ConnectorError> {
        self.as_dyn().switch_chain(chain_id).await
    }
}
