//! # Connector Registry
//!
//! Builds connectors from specs, tags each with a fresh uid and attaches
//! its event queue to the shared inbox.

use std::sync::Arc;

use ck_01_chain_client::ClientCache;
use ck_02_connectors::{Connector, ConnectorConfig, ConnectorContext, ConnectorSpec, Eip6963ProviderDetail};
use parking_lot::RwLock;
use shared_bus::EventInbox;
use shared_types::Uid;
use tracing::{debug, info};

pub struct ConnectorRegistry {
    inbox: EventInbox,
    clients: Arc<ClientCache>,
    config: ConnectorConfig,
    connectors: RwLock<Vec<Arc<Connector>>>,
}

impl ConnectorRegistry {
    pub fn new(clients: Arc<ClientCache>, config: ConnectorConfig) -> Self {
        Self {
            inbox: EventInbox::new(),
            clients,
            config,
            connectors: RwLock::new(Vec::new()),
        }
    }

    /// Build and register a connector.
    pub fn setup(&self, spec: ConnectorSpec) -> Arc<Connector> {
        let uid = Uid::generate();
        let emitter = self.inbox.attach(uid.clone());
        let ctx = ConnectorContext::new(emitter, self.clients.clone(), self.config.clone());
        let connector = Arc::new(spec.build(ctx));
        info!(uid = %uid, id = connector.id(), kind = %connector.kind(), "Connector registered");
        self.connectors.write().push(connector.clone());
        connector
    }

    /// Register an announced provider unless a connector with its id exists.
    pub fn add_discovered(&self, detail: Eip6963ProviderDetail) -> Option<Arc<Connector>> {
        if self.find_by_id(detail.connector_id()).is_some() {
            debug!(rdns = detail.connector_id(), "Provider already registered");
            return None;
        }
        Some(self.setup(detail.into_spec()))
    }

    pub fn get(&self, uid: &Uid) -> Option<Arc<Connector>> {
        self.connectors.read().iter().find(|c| c.uid() == uid).cloned()
    }

    pub fn find_by_id(&self, id: &str) -> Option<Arc<Connector>> {
        self.connectors.read().iter().find(|c| c.id() == id).cloned()
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.get(uid).is_some()
    }

    pub fn list(&self) -> Vec<Arc<Connector>> {
        self.connectors.read().clone()
    }

    pub fn len(&self) -> usize {
        self.connectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inbox(&self) -> &EventInbox {
        &self.inbox
    }

    pub fn clients(&self) -> &Arc<ClientCache> {
        &self.clients
    }
}
