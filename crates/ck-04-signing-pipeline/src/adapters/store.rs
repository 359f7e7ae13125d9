//! # Config Store Session Source

use std::sync::Arc;

use ck_01_chain_client::{ChainClient, ChainConfig};
use ck_03_config_store::{ConfigStore, Connection};
use shared_types::{ChainId, Uid};

use crate::domain::errors::PipelineError;
use crate::ports::outbound::{SessionSource, SigningSession};

impl SessionSource for ConfigStore {
    fn signing_session(&self, uid: Option<&Uid>) -> Result<SigningSession, PipelineError> {
        let connection = match uid {
            Some(uid) => self
                .connection(uid)
                .ok_or_else(|| PipelineError::ConnectionNotFound(uid.clone()))?,
            None => {
                let chain_id = self.chain_id();
                self.connection_for_chain(&chain_id)
                    .ok_or(PipelineError::NoConnectionForChain(chain_id))?
            }
        };
        let connector = self
            .connector(connection.uid())
            .ok_or_else(|| PipelineError::ConnectorNotFound(connection.uid().clone()))?;

        Ok(SigningSession { connector, connection })
    }

    fn current_connection(&self, uid: &Uid) -> Option<Connection> {
        self.connection(uid)
    }

    fn client(&self, chain_id: &ChainId) -> Result<Arc<ChainClient>, PipelineError> {
        Ok(self.get_client(Some(chain_id))?)
    }

    fn chain_config(&self, chain_id: &ChainId) -> Option<ChainConfig> {
        self.registry().clients().config(chain_id).cloned()
    }
}
