//! # Connect Kit
//!
//! Owns every long-lived component and the background fold loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ck_01_chain_client::{ClientCache, SimulateOutcome};
use ck_02_connectors::{Connector, ConnectorSpec};
use ck_03_config_store::{ConfigStore, ConnectorRegistry, FileStorage, MemoryStorage, Storage};
use ck_04_signing_pipeline::{BroadcastOutcome, PipelineError, SignAndBroadcast, SigningApi, SigningPipeline};
use connect_telemetry::{log_event, log_tx_event, time_histogram, BROADCAST_DURATION};
use parking_lot::Mutex;
use shared_types::{AccountType, Addr, ChainId, KeyHash, Message, Uid, Username};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::container::config::KitConfig;
use crate::wiring::metrics;

pub struct ConnectKit {
    config: KitConfig,
    store: Arc<ConfigStore>,
    pipeline: SigningPipeline<Arc<ConfigStore>>,
    shutdown_tx: watch::Sender<bool>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectKit {
    /// Build the kit with HTTP transports for every configured chain.
    pub fn new(config: KitConfig) -> Result<Self> {
        let clients = ClientCache::from_configs(config.chains.iter().cloned(), &config.transport)
            .context("Failed to build chain clients")?;
        Self::with_clients(config, clients)
    }

    /// Build the kit on an existing client cache.
    pub fn with_clients(config: KitConfig, clients: ClientCache) -> Result<Self> {
        config.validate().context("Invalid kit configuration")?;

        let storage: Arc<dyn Storage> = match &config.storage.dir {
            Some(dir) => Arc::new(
                FileStorage::new(dir.clone())
                    .with_context(|| format!("Failed to open session storage at {}", dir.display()))?,
            ),
            None => Arc::new(MemoryStorage::new()),
        };

        let registry = ConnectorRegistry::new(Arc::new(clients), config.connectors.clone());
        let store = Arc::new(ConfigStore::new(config.store.clone(), registry, Some(storage)));
        metrics::attach_store_metrics(&store);

        let pipeline = SigningPipeline::new(store.clone(), config.pipeline.clone());
        let (shutdown_tx, _) = watch::channel(false);

        info!(
            chains = config.chains.len(),
            default_chain = %config.store.default_chain_id,
            status = %store.status(),
            "Connect kit created"
        );

        Ok(Self {
            config,
            store,
            pipeline,
            shutdown_tx,
            event_loop: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &SigningPipeline<Arc<ConfigStore>> {
        &self.pipeline
    }

    /// Register a connector with the store.
    pub fn setup_connector(&self, spec: ConnectorSpec) -> Arc<Connector> {
        self.store.registry().setup(spec)
    }

    /// Start the fold loop and revalidate hydrated sessions.
    ///
    /// Register every connector that may own a persisted session first.
    /// Returns the uids that reconnected.
    pub async fn start(&self) -> Result<Vec<Uid>> {
        {
            let mut event_loop = self.event_loop.lock();
            if event_loop.is_none() {
                let store = self.store.clone();
                let shutdown = self.shutdown_tx.subscribe();
                *event_loop = Some(tokio::spawn(async move { store.run(shutdown).await }));
            }
        }

        let reconnected = self.store.reconnect().await.context("Session rehydration failed")?;
        log_event!(
            info,
            "runtime",
            "Connect kit started",
            reconnected = reconnected.len(),
            status = %self.store.status()
        );
        Ok(reconnected)
    }

    /// Stop the fold loop after draining queued events.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.event_loop.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Event loop terminated abnormally");
            }
        }
        log_event!(info, "runtime", "Connect kit stopped");
    }
}

#[async_trait]
impl SigningApi for ConnectKit {
    async fn sign_and_broadcast(&self, request: SignAndBroadcast) -> Result<BroadcastOutcome, PipelineError> {
        let _timer = time_histogram!(BROADCAST_DURATION);
        let result = self.pipeline.sign_and_broadcast(request).await;
        metrics::record_broadcast(&result);
        if let Ok(outcome) = &result {
            log_tx_event!(debug, "runtime", "Broadcast recorded", outcome.hash, chain_id = %outcome.chain_id);
        }
        result
    }

    async fn simulate(
        &self,
        chain_id: &ChainId,
        sender: Addr,
        msgs: Vec<Message>,
    ) -> Result<SimulateOutcome, PipelineError> {
        self.pipeline.simulate(chain_id, sender, msgs).await
    }

    async fn estimate_gas(&self, chain_id: &ChainId, sender: Addr, msgs: Vec<Message>) -> Result<u64, PipelineError> {
        self.pipeline.estimate_gas(chain_id, sender, msgs).await
    }

    fn predict_account_address(
        &self,
        chain_id: &ChainId,
        username: &Username,
        key_hash: &KeyHash,
        account_type: AccountType,
    ) -> Result<Addr, PipelineError> {
        self.pipeline
            .predict_account_address(chain_id, username, key_hash, account_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ck_01_chain_client::{ChainConfig, Key, MockChain};
    use ck_02_connectors::{ConnectParameters, MockAuthenticator, WebAuthnAuthenticator};
    use shared_types::{Binary, Coins, ConnectionStatus};

    const FACTORY: Addr = Addr([0xfa; 20]);
    const SPOT: Addr = Addr([0x10; 20]);

    fn mock_chain() -> Arc<MockChain> {
        let chain = Arc::new(MockChain::new("dev-1", FACTORY));
        chain.register_account("alice", SPOT, 0, AccountType::Spot);
        chain
    }

    fn authenticator(chain: &MockChain) -> Arc<MockAuthenticator> {
        let authenticator = Arc::new(MockAuthenticator::new(&[9; 32], b"credential-1".to_vec()).unwrap());
        chain.register_key(
            "alice",
            authenticator.key_hash(),
            Key::Secp256r1(Binary(authenticator.public_key())),
        );
        authenticator
    }

    fn build_kit(config: KitConfig, chain: &Arc<MockChain>) -> ConnectKit {
        let clients = ClientCache::new().with_chain(ChainConfig::for_testing("dev-1"), chain.clone());
        ConnectKit::with_clients(config, clients).unwrap()
    }

    #[tokio::test]
    async fn test_sign_and_broadcast_through_kit() {
        let chain = mock_chain();
        let authenticator = authenticator(&chain);
        let kit = build_kit(KitConfig::for_testing(&["dev-1"]), &chain);
        let uid = kit
            .setup_connector(ConnectorSpec::passkey(authenticator as Arc<dyn WebAuthnAuthenticator>))
            .uid()
            .clone();
        kit.start().await.unwrap();

        let mut params = ConnectParameters::new("alice", "dev-1");
        params.challenge = Some("prove".to_string());
        kit.store().connect(&uid, params).await.unwrap();

        let outcome = kit
            .sign_and_broadcast(SignAndBroadcast::new(vec![Message::transfer(
                Addr([0x22; 20]),
                Coins::one("uusdc", 5),
            )]))
            .await
            .unwrap();
        assert_eq!(outcome.tx.sender, SPOT);
        assert_eq!(chain.broadcasts().len(), 1);

        kit.shutdown().await;
    }

    #[tokio::test]
    async fn test_sessions_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let chain = mock_chain();
        let authenticator = authenticator(&chain);
        let mut config = KitConfig::for_testing(&["dev-1"]);
        config.storage.dir = Some(dir.path().to_path_buf());

        {
            let kit = build_kit(config.clone(), &chain);
            let uid = kit
                .setup_connector(ConnectorSpec::passkey(authenticator.clone() as Arc<dyn WebAuthnAuthenticator>))
                .uid()
                .clone();
            kit.start().await.unwrap();
            let mut params = ConnectParameters::new("alice", "dev-1");
            params.challenge = Some("prove".to_string());
            kit.store().connect(&uid, params).await.unwrap();
            kit.shutdown().await;
        }
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_some());

        let kit = build_kit(config, &chain);
        assert_eq!(kit.store().status(), ConnectionStatus::Reconnecting);
        kit.setup_connector(ConnectorSpec::passkey(authenticator as Arc<dyn WebAuthnAuthenticator>));

        let reconnected = kit.start().await.unwrap();
        assert_eq!(reconnected.len(), 1);
        assert_eq!(kit.store().status(), ConnectionStatus::Connected);
        kit.shutdown().await;
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let chain = mock_chain();
        let mut config = KitConfig::for_testing(&["dev-1"]);
        config.store.default_chain_id = ChainId::new("dev-9");
        let clients = ClientCache::new().with_chain(ChainConfig::for_testing("dev-1"), chain);
        assert!(ConnectKit::with_clients(config, clients).is_err());
    }
}
