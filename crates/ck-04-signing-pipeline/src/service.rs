//! # Signing Pipeline Service
//!
//! Implements `SigningApi` over any `SessionSource`.
//!
//! ## Steps
//!
//! 1. chain id: pinned on the client, else `query_info` (fatal on failure)
//! 2. sequence: account `state` query, `0` on any failure
//! 3. sign bytes: `sha256(canonical(msgs) ∥ sender ∥ chain_id ∥ be32(sequence))`
//! 4. connector `sign_tx`
//! 5. gas: explicit, else simulate plus headroom
//! 6. the connection must be unchanged since step 1
//! 7. `broadcast_tx_sync`; non-zero `code` is a hard failure

use async_trait::async_trait;
use ck_01_chain_client::{ChainApi, ChainClient, SimulateOutcome};
use ck_02_connectors::{SignDoc, WalletConnector};
use ck_03_config_store::{Connection, StoreError};
use shared_crypto::{derive_address, new_user_salt, sign_bytes};
use shared_types::{AccountType, Addr, ChainId, KeyHash, Message, Metadata, Tx, UnsignedTx, Username};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::domain::entities::{BroadcastOutcome, SignAndBroadcast};
use crate::domain::errors::PipelineError;
use crate::ports::inbound::SigningApi;
use crate::ports::outbound::{SessionSource, SigningSession};

pub struct SigningPipeline<S: SessionSource> {
    sessions: S,
    config: PipelineConfig,
}

impl<S: SessionSource> SigningPipeline<S> {
    pub fn new(sessions: S, config: PipelineConfig) -> Self {
        Self { sessions, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn resolve_chain_id(&self, client: &ChainClient) -> Result<ChainId, PipelineError> {
        if let Some(chain_id) = client.pinned_chain_id() {
            return Ok(chain_id.clone());
        }
        match client.query_info().await {
            Ok(info) => Ok(info.chain_id),
            Err(e) => {
                error!(error = %e, "Chain id query failed");
                Err(PipelineError::ChainId(e))
            }
        }
    }

    /// Never fails: an account that cannot be read has not sent anything yet.
    /// The flag is set when the lookup failed.
    async fn resolve_sequence(&self, client: &ChainClient, sender: &Addr) -> (u32, bool) {
        match client.account_sequence(sender).await {
            Ok(sequence) => (sequence, false),
            Err(e) => {
                warn!(sender = %sender, error = %e, "Sequence lookup failed; using 0");
                (0, true)
            }
        }
    }

    async fn gas_for(&self, client: &ChainClient, sender: Addr, msgs: &[Message]) -> Result<u64, PipelineError> {
        let outcome = client
            .simulate(&UnsignedTx {
                sender,
                msgs: msgs.to_vec(),
            })
            .await?;
        Ok(self.config.gas.limit_for(outcome.gas_used))
    }

    fn ensure_unchanged(&self, signed_for: &Connection) -> Result<(), PipelineError> {
        let uid = signed_for.uid();
        let unchanged = self.sessions.current_connection(uid).is_some_and(|current| {
            current.username == signed_for.username
                && current.chain_id == signed_for.chain_id
                && current.key_hash == signed_for.key_hash
        });
        if unchanged {
            Ok(())
        } else {
            warn!(uid = %uid, "Connection changed while signing; transaction dropped");
            Err(PipelineError::ConnectionChanged(uid.clone()))
        }
    }
}

#[async_trait]
impl<S: SessionSource> SigningApi for SigningPipeline<S> {
    async fn sign_and_broadcast(&self, request: SignAndBroadcast) -> Result<BroadcastOutcome, PipelineError> {
        let SigningSession { connector, connection } = self.sessions.signing_session(request.uid.as_ref())?;
        let uid = connection.uid().clone();

        if !connector.is_authorized() {
            error!(uid = %uid, "Connector holds no proven key");
            return Err(PipelineError::NotAuthorized);
        }

        let sender = match request.sender {
            Some(sender) => sender,
            None => connection
                .account()
                .map(|account| account.address)
                .ok_or_else(|| PipelineError::NoSender(uid.clone()))?,
        };
        let client = self.sessions.client(&connection.chain_id)?;

        let chain_id = self.resolve_chain_id(&client).await?;
        let (sequence, sequence_fallback) = self.resolve_sequence(&client, &sender).await;
        let hash = sign_bytes(&request.msgs, &sender, &chain_id, sequence)?;

        let doc = SignDoc {
            sender,
            msgs: request.msgs.clone(),
            chain_id: chain_id.clone(),
            sequence,
            sign_bytes: hash,
        };
        let credential = connector.sign_tx(&doc).await.map_err(|e| {
            error!(uid = %uid, error = %e, "Signing failed");
            e
        })?;

        let gas_limit = match request.gas_limit {
            Some(gas_limit) => gas_limit,
            None => self.gas_for(&client, sender, &request.msgs).await?,
        };

        self.ensure_unchanged(&connection)?;

        let tx = Tx {
            sender,
            gas_limit,
            msgs: request.msgs,
            data: Metadata {
                username: connection.username.clone(),
                key_hash: credential.key_hash,
                sequence,
            },
            credential,
        };

        let response = client.broadcast_tx_sync(&tx).await?;
        if response.code != 0 {
            error!(
                uid = %uid,
                code = response.code,
                codespace = %response.codespace,
                log = %response.log,
                "Broadcast rejected"
            );
            return Err(PipelineError::Broadcast {
                codespace: response.codespace,
                code: response.code,
                log: response.log,
            });
        }

        info!(
            uid = %uid,
            chain_id = %chain_id,
            sender = %sender,
            sequence,
            gas_limit,
            hash = %response.hash,
            "Broadcast accepted"
        );
        Ok(BroadcastOutcome {
            hash: response.hash,
            chain_id,
            sign_bytes: hash,
            sequence_fallback,
            tx,
        })
    }

    async fn simulate(
        &self,
        chain_id: &ChainId,
        sender: Addr,
        msgs: Vec<Message>,
    ) -> Result<SimulateOutcome, PipelineError> {
        let client = self.sessions.client(chain_id)?;
        Ok(client.simulate(&UnsignedTx { sender, msgs }).await?)
    }

    async fn estimate_gas(&self, chain_id: &ChainId, sender: Addr, msgs: Vec<Message>) -> Result<u64, PipelineError> {
        let client = self.sessions.client(chain_id)?;
        self.gas_for(&client, sender, &msgs).await
    }

    fn predict_account_address(
        &self,
        chain_id: &ChainId,
        username: &Username,
        key_hash: &KeyHash,
        account_type: AccountType,
    ) -> Result<Addr, PipelineError> {
        let config = self
            .sessions
            .chain_config(chain_id)
            .ok_or_else(|| StoreError::ChainNotConfigured(chain_id.clone()))?;
        let factory = config
            .account_factory
            .ok_or_else(|| PipelineError::AccountFactoryNotConfigured(chain_id.clone()))?;
        let code_hash = config
            .account_code_hash
            .ok_or_else(|| PipelineError::CodeHashNotConfigured(chain_id.clone()))?;

        let salt = new_user_salt(username.as_str(), key_hash, account_type)?;
        Ok(derive_address(&factory, &code_hash, &salt))
    }
}
