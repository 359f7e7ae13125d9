//! Shared fixtures for connector tests.

use std::sync::Arc;

use ck_01_chain_client::{ChainConfig, ClientCache, Key, MockChain};
use shared_bus::EventInbox;
use shared_types::{AccountType, Addr, KeyHash, Uid};

use crate::config::ConnectorConfig;
use crate::context::ConnectorContext;

pub(crate) const FACTORY: Addr = Addr([0xfa; 20]);

pub(crate) struct Fixture {
    pub chain: Arc<MockChain>,
    pub inbox: EventInbox,
    pub clients: Arc<ClientCache>,
}

impl Fixture {
    pub fn new() -> Self {
        let chain = Arc::new(MockChain::new("dev-1", FACTORY));
        let clients = Arc::new(ClientCache::new().with_chain(ChainConfig::for_testing("dev-1"), chain.clone()));
        Self {
            chain,
            inbox: EventInbox::new(),
            clients,
        }
    }

    pub fn context(&self, uid: &str) -> ConnectorContext {
        ConnectorContext::new(
            self.inbox.attach(Uid::new(uid)),
            self.clients.clone(),
            ConnectorConfig::for_testing(),
        )
    }

    /// Register one key and one spot account for `username`.
    pub fn register_user(&self, username: &str, key_hash: KeyHash, key: Key) {
        self.chain.register_key(username, key_hash, key);
        self.chain
            .register_account(username, Addr([0x10; 20]), 0, AccountType::Spot);
    }
}
