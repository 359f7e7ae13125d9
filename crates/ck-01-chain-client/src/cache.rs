//! # Client Cache
//!
//! One lazily-built `ChainClient` per configured chain.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::ChainId;
use tracing::debug;

use crate::adapters::http::HttpTransport;
use crate::config::{ChainConfig, TransportConfig};
use crate::domain::errors::ChainClientError;
use crate::ports::outbound::RpcTransport;
use crate::service::ChainClient;

struct ChainEntry {
    config: ChainConfig,
    transport: Arc<dyn RpcTransport>,
}

/// Configured chains and their memoized clients.
#[derive(Default)]
pub struct ClientCache {
    chains: BTreeMap<ChainId, ChainEntry>,
    clients: Mutex<HashMap<ChainId, Arc<ChainClient>>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP transports for every chain in `configs`.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ChainConfig>,
        transport: &TransportConfig,
    ) -> Result<Self, ChainClientError> {
        let mut cache = Self::new();
        for config in configs {
            let http = HttpTransport::new(&config.rpc_url, transport)?;
            cache.register(config, Arc::new(http));
        }
        Ok(cache)
    }

    /// Builder form of `register`.
    pub fn with_chain(mut self, config: ChainConfig, transport: Arc<dyn RpcTransport>) -> Self {
        self.register(config, transport);
        self
    }

    /// Add or replace a chain. Replacing drops the memoized client.
    pub fn register(&mut self, config: ChainConfig, transport: Arc<dyn RpcTransport>) {
        let chain_id = config.chain_id.clone();
        self.clients.get_mut().remove(&chain_id);
        self.chains.insert(chain_id, ChainEntry { config, transport });
    }

    pub fn is_configured(&self, chain_id: &ChainId) -> bool {
        self.chains.contains_key(chain_id)
    }

    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.chains.keys().cloned().collect()
    }

    pub fn config(&self, chain_id: &ChainId) -> Option<&ChainConfig> {
        self.chains.get(chain_id).map(|entry| &entry.config)
    }

    /// Client for `chain_id`, or `None` if the chain is not configured.
    pub fn client(&self, chain_id: &ChainId) -> Option<Arc<ChainClient>> {
        let entry = self.chains.get(chain_id)?;
        let mut clients = self.clients.lock();
        let client = clients.entry(chain_id.clone()).or_insert_with(|| {
            debug!(chain_id = %chain_id, "Creating chain client");
            Arc::new(ChainClient::from_config(&entry.config, entry.transport.clone()))
        });
        Some(client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::inbound::ChainApi;
    use crate::ports::outbound::MockChain;
    use shared_types::Addr;

    fn cache() -> ClientCache {
        let chain = Arc::new(MockChain::new("dev-1", Addr([0xfa; 20])));
        ClientCache::new().with_chain(ChainConfig::for_testing("dev-1"), chain)
    }

    #[test]
    fn test_client_is_memoized() {
        let cache = cache();
        let a = cache.client(&ChainId::new("dev-1")).unwrap();
        let b = cache.client(&ChainId::new("dev-1")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.pinned_chain_id(), Some(&ChainId::new("dev-1")));
    }

    #[test]
    fn test_unconfigured_chain_has_no_client() {
        let cache = cache();
        assert!(cache.client(&ChainId::new("other-1")).is_none());
        assert!(!cache.is_configured(&ChainId::new("other-1")));
        assert_eq!(cache.chain_ids(), vec![ChainId::new("dev-1")]);
    }

    #[test]
    fn test_register_replaces_client() {
        let mut cache = cache();
        let before = cache.client(&ChainId::new("dev-1")).unwrap();
        let chain = Arc::new(MockChain::new("dev-1", Addr([0xfb; 20])));
        let mut config = ChainConfig::for_testing("dev-1");
        config.account_factory = Some(Addr([0xfb; 20]));
        cache.register(config, chain);

        let after = cache.client(&ChainId::new("dev-1")).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.account_factory(), Some(&Addr([0xfb; 20])));
    }

    #[test]
    fn test_from_configs_builds_http_transports() {
        let cache = ClientCache::from_configs(
            vec![ChainConfig::for_testing("dev-1"), ChainConfig::for_testing("dev-2")],
            &TransportConfig::default(),
        )
        .unwrap();
        assert_eq!(cache.chain_ids().len(), 2);
    }
}
