//! # Connector Context
//!
//! What the registry hands a connector when it is built: its uid, the
//! sending half of its event queue, the per-chain clients and the shared
//! connector settings.

use std::sync::Arc;

use ck_01_chain_client::{ChainApi, ChainClient, ClientCache};
use shared_bus::{AttemptTicket, ConnectPayload, EmitError, Emitter};
use shared_types::{Account, ChainId, KeyHash, Uid, Username};
use tracing::{debug, info, warn};

use crate::config::ConnectorConfig;
use crate::domain::errors::ConnectorError;
use crate::domain::session::{Session, SessionState};

#[derive(Clone)]
pub struct ConnectorContext {
    pub uid: Uid,
    pub emitter: Emitter,
    pub clients: Arc<ClientCache>,
    pub config: ConnectorConfig,
}

impl ConnectorContext {
    pub fn new(emitter: Emitter, clients: Arc<ClientCache>, config: ConnectorConfig) -> Self {
        Self {
            uid: emitter.uid().clone(),
            emitter,
            clients,
            config,
        }
    }

    pub fn client(&self, chain_id: &ChainId) -> Result<Arc<ChainClient>, ConnectorError> {
        self.clients
            .client(chain_id)
            .ok_or_else(|| ConnectorError::ChainNotConfigured(chain_id.clone()))
    }

    /// Fail with `NotAuthorized` unless `key_hash` is registered to `username`.
    pub async fn ensure_registered_key(
        &self,
        client: &ChainClient,
        username: &Username,
        key_hash: &KeyHash,
    ) -> Result<(), ConnectorError> {
        let keys = client.keys_by_username(username).await?;
        if !keys.contains_key(key_hash) {
            warn!(uid = %self.uid, username = %username, key_hash = %key_hash, "Key not registered for user");
            return Err(ConnectorError::NotAuthorized);
        }
        Ok(())
    }

    /// Shared tail of every `connect`: seat the session and emit, unless the
    /// attempt was superseded in the meantime.
    pub fn complete_connect(
        &self,
        session: &SessionState,
        ticket: AttemptTicket,
        params: Session,
        accounts: Vec<Account>,
    ) -> Result<(), ConnectorError> {
        if self.emitter.current_attempt() != ticket.0 {
            return Err(ConnectorError::Superseded);
        }

        let payload = ConnectPayload {
            username: params.username.clone(),
            accounts,
            chain_id: params.chain_id.clone(),
            key_hash: params.key_hash,
        };
        session.seat(params);

        match self.emitter.emit_connect(ticket, payload) {
            Ok(()) => {
                info!(uid = %self.uid, "Connect ceremony completed");
                Ok(())
            }
            Err(EmitError::Stale { .. }) => {
                session.clear();
                Err(ConnectorError::Superseded)
            }
            Err(e) => {
                session.clear();
                Err(e.into())
            }
        }
    }

    /// Shared `disconnect`: always succeeds locally.
    ///
    /// The attempt counter is bumped before the session is cleared, so a
    /// `connect` racing this call either lands ahead of the disconnect or
    /// fails as stale and clears the session itself.
    pub fn complete_disconnect(&self, session: &SessionState) {
        if let Err(e) = self.emitter.emit_disconnect() {
            debug!(uid = %self.uid, error = %e, "Disconnect not delivered");
        }
        session.clear();
    }
}
