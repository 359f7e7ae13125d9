//! # Outbound Port
//!
//! Where the pipeline gets its connection, connector and chain client.

use std::sync::Arc;

use ck_01_chain_client::{ChainClient, ChainConfig};
use ck_02_connectors::Connector;
use ck_03_config_store::Connection;
use shared_types::{ChainId, Uid};

use crate::domain::errors::PipelineError;

/// A connection snapshot and the connector that owns it.
#[derive(Debug, Clone)]
pub struct SigningSession {
    pub connector: Arc<Connector>,
    pub connection: Connection,
}

pub trait SessionSource: Send + Sync {
    /// Session for `uid`, or for the connector active on the current chain.
    fn signing_session(&self, uid: Option<&Uid>) -> Result<SigningSession, PipelineError>;

    /// Fresh read of a connection.
    fn current_connection(&self, uid: &Uid) -> Option<Connection>;

    fn client(&self, chain_id: &ChainId) -> Result<Arc<ChainClient>, PipelineError>;

    fn chain_config(&self, chain_id: &ChainId) -> Option<ChainConfig>;
}

impl<T: SessionSource + ?Sized> SessionSource for Arc<T> {
    fn signing_session(&self, uid: Option<&Uid>) -> Result<SigningSession, PipelineError> {
        (**self).signing_session(uid)
    }

    fn current_connection(&self, uid: &Uid) -> Option<Connection> {
        (**self).current_connection(uid)
    }

    fn client(&self, chain_id: &ChainId) -> Result<Arc<ChainClient>, PipelineError> {
        (**self).client(chain_id)
    }

    fn chain_config(&self, chain_id: &ChainId) -> Option<ChainConfig> {
        (**self).chain_config(chain_id)
    }
}
