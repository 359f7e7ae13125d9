//! # Config Store Service
//!
//! The single-writer state machine. Connectors never touch state; they
//! emit events into the shared inbox and the store folds them here.
//!
//! ## Listener phases
//!
//! Each connector uid is either `Armed` (only `connect` is folded) or
//! `Live` (only `change` and `disconnect` are folded). A folded
//! `connect` moves the uid to `Live`, a folded `disconnect` back to
//! `Armed`. A second `connect` from a live connector is dropped, so a
//! connector can never hold two connections or double-apply a change.
//!
//! ## Locking
//!
//! `fold_lock` serialises every read-modify-write of the state. The state
//! itself is an `Arc<State>` swapped whole; readers never observe a
//! partially applied fold. Observers run after `fold_lock` is released.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ck_01_chain_client::ChainClient;
use ck_02_connectors::{ConnectParameters, Connector, Eip6963ProviderDetail, WalletConnector};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared_bus::{ConnectorEvent, Envelope, EventKind};
use shared_types::{Addr, ChainId, ConnectionStatus, Uid};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapters::persistence::PersistenceAdapter;
use crate::config::StoreConfig;
use crate::domain::errors::StoreError;
use crate::domain::fold;
use crate::domain::state::{Connection, State};
use crate::observers::{FoldOutcome, ObserverList, SubscriptionId};
use crate::ports::outbound::Storage;
use crate::registry::ConnectorRegistry;

/// Which events the store currently folds for a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPhase {
    Armed,
    Live,
}

type Transition = (Arc<State>, Arc<State>);

pub struct ConfigStore {
    config: StoreConfig,
    registry: ConnectorRegistry,
    state: RwLock<Arc<State>>,
    fold_lock: Mutex<()>,
    live: Mutex<HashSet<Uid>>,
    /// Highest connect/disconnect attempt folded per connector.
    attempts: Mutex<HashMap<Uid, u64>>,
    observers: ObserverList,
    persistence: Option<PersistenceAdapter>,
    /// Hydrated sessions awaiting `reconnect`.
    pending: Mutex<Vec<Connection>>,
}

impl ConfigStore {
    /// Build the store and hydrate it from `storage`.
    ///
    /// Persisted connections are never seated directly. They are held as
    /// pending sessions and the store starts `reconnecting` until
    /// [`ConfigStore::reconnect`] revalidates them.
    pub fn new(config: StoreConfig, registry: ConnectorRegistry, storage: Option<Arc<dyn Storage>>) -> Self {
        let persistence = storage.map(|storage| {
            PersistenceAdapter::new(
                storage,
                config.storage_key.clone(),
                config.schema_version,
                registry.clients().chain_ids(),
            )
        });

        let initial = State::initial(
            config.default_chain_id.clone(),
            !config.multi_injected_provider_discovery,
        );
        let hydrated = match &persistence {
            Some(persistence) => persistence.load(&initial),
            None => initial.clone(),
        };

        let pending: Vec<Connection> = hydrated.connections.into_values().collect();
        let status = if pending.is_empty() {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::Reconnecting
        };
        if !pending.is_empty() {
            info!(sessions = pending.len(), "Hydrated persisted sessions");
        }

        let state = State {
            chain_id: hydrated.chain_id,
            status,
            ..initial
        };

        Self {
            config,
            registry,
            state: RwLock::new(Arc::new(state)),
            fold_lock: Mutex::new(()),
            live: Mutex::new(HashSet::new()),
            attempts: Mutex::new(HashMap::new()),
            observers: ObserverList::new(),
            persistence,
            pending: Mutex::new(pending),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn state(&self) -> Arc<State> {
        self.state.read().clone()
    }

    pub fn chain_id(&self) -> ChainId {
        self.state.read().chain_id.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.read().status
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    pub fn connection(&self, uid: &Uid) -> Option<Connection> {
        self.state.read().connections.get(uid).cloned()
    }

    pub fn connection_for_chain(&self, chain_id: &ChainId) -> Option<Connection> {
        self.state.read().connection_for_chain(chain_id).cloned()
    }

    pub fn connectors(&self) -> Vec<Arc<Connector>> {
        self.registry.list()
    }

    pub fn connector(&self, uid: &Uid) -> Option<Arc<Connector>> {
        self.registry.get(uid)
    }

    /// Hydrated sessions not yet revalidated.
    pub fn pending_sessions(&self) -> Vec<Connection> {
        self.pending.lock().clone()
    }

    pub fn phase(&self, uid: &Uid) -> ListenerPhase {
        if self.live.lock().contains(uid) {
            ListenerPhase::Live
        } else {
            ListenerPhase::Armed
        }
    }

    /// Client for `chain_id`, or for the state chain when `None`.
    ///
    /// # Errors
    ///
    /// - `ChainIdNotProvided` if no chain id is given and none is selected
    /// - `ChainNotConfigured` if the chain has no client
    pub fn get_client(&self, chain_id: Option<&ChainId>) -> Result<Arc<ChainClient>, StoreError> {
        let chain_id = match chain_id {
            Some(chain_id) => chain_id.clone(),
            None => self.chain_id(),
        };
        if chain_id.as_str().is_empty() {
            return Err(StoreError::ChainIdNotProvided);
        }
        self.registry
            .clients()
            .client(&chain_id)
            .ok_or(StoreError::ChainNotConfigured(chain_id))
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&State, &State) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    /// Listen to a projection of the state. With `fire_immediately` the
    /// listener runs once right away with the current value as both
    /// arguments.
    pub fn subscribe_with_selector<T, S, F>(&self, selector: S, listener: F, fire_immediately: bool) -> SubscriptionId
    where
        T: PartialEq + Send + Sync + 'static,
        S: Fn(&State) -> T + Send + Sync + 'static,
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let current = self.state();
        let fire = fire_immediately.then_some(current.as_ref());
        self.observers.subscribe_with_selector(selector, listener, fire)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Listen to every folded event and whether it changed the state.
    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&Uid, EventKind, FoldOutcome) + Send + Sync + 'static,
    {
        self.observers.on_event(listener);
    }

    // =========================================================================
    // External state replacement
    // =========================================================================

    fn initial_state(&self) -> State {
        State::initial(
            self.config.default_chain_id.clone(),
            !self.config.multi_injected_provider_discovery,
        )
    }

    /// Replace the whole state.
    ///
    /// A state that breaks an invariant or references an unregistered
    /// connector is discarded in favour of the initial state. Returns
    /// whether the supplied state was accepted.
    pub fn set_state(&self, state: State) -> bool {
        let rejection = match state.check_invariants() {
            Err(reason) => Some(reason),
            Ok(()) => state
                .connections
                .keys()
                .find(|uid| !self.registry.contains(uid))
                .map(|uid| format!("connection for unregistered connector {uid}")),
        };

        let (accepted, next) = match rejection {
            None => (true, state),
            Some(reason) => {
                warn!(reason = %reason, "Replacement state rejected; resetting to initial state");
                (false, self.initial_state())
            }
        };

        let transition = {
            let _guard = self.fold_lock.lock();
            *self.live.lock() = next.connections.keys().cloned().collect();
            self.commit(next)
        };
        self.observers.notify(&transition.0, &transition.1);
        accepted
    }

    /// Replace the state from an untyped payload.
    ///
    /// Missing any top-level key of the initial state counts as corruption.
    pub fn set_state_raw(&self, value: Value) -> bool {
        let initial = self.initial_state();
        let complete = match (&value, serde_json::to_value(&initial)) {
            (Value::Object(supplied), Ok(Value::Object(expected))) => {
                expected.keys().all(|key| supplied.contains_key(key))
            }
            _ => false,
        };
        if !complete {
            warn!("Replacement state is missing required keys; resetting to initial state");
            self.set_state(initial);
            return false;
        }

        match serde_json::from_value::<State>(value) {
            Ok(state) => self.set_state(state),
            Err(e) => {
                warn!(error = %e, "Replacement state is malformed; resetting to initial state");
                self.set_state(initial);
                false
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run a connector's ceremony and fold the resulting `connect`.
    ///
    /// # Errors
    ///
    /// - `ConnectorNotFound` for an unregistered uid
    /// - `AlreadyConnected` if the connector holds a live connection
    /// - `Connector(..)` when the ceremony fails; state is left as it was
    pub async fn connect(&self, uid: &Uid, params: ConnectParameters) -> Result<Connection, StoreError> {
        let connector = self
            .connector(uid)
            .ok_or_else(|| StoreError::ConnectorNotFound(uid.clone()))?;
        if self.phase(uid) == ListenerPhase::Live {
            return Err(StoreError::AlreadyConnected(uid.clone()));
        }

        self.update(|state| {
            (state.connections.is_empty() && state.status == ConnectionStatus::Disconnected).then(|| State {
                status: ConnectionStatus::Connecting,
                ..state.clone()
            })
        });

        let result = connector.connect(params).await;
        self.process_events();

        if let Err(e) = result {
            self.settle(ConnectionStatus::Connecting);
            error!(uid = %uid, error = %e, "Connect failed");
            return Err(e.into());
        }

        self.connection(uid)
            .ok_or_else(|| StoreError::ConnectionNotFound(uid.clone()))
    }

    /// Disconnect a connector. Succeeds even if it was not connected.
    pub async fn disconnect(&self, uid: &Uid) -> Result<(), StoreError> {
        let connector = self
            .connector(uid)
            .ok_or_else(|| StoreError::ConnectorNotFound(uid.clone()))?;
        connector.disconnect().await?;
        self.process_events();
        Ok(())
    }

    /// Point the connection's active account at `address`.
    pub fn switch_account(&self, uid: &Uid, address: &Addr) -> Result<Connection, StoreError> {
        let connection = self
            .connection(uid)
            .ok_or_else(|| StoreError::ConnectionNotFound(uid.clone()))?;
        if !connection.accounts.iter().any(|a| a.address == *address) {
            return Err(StoreError::AccountNotFound {
                uid: uid.clone(),
                address: *address,
            });
        }

        self.update(|state| fold::select_account(state, uid, address));
        debug!(uid = %uid, address = %address, "Active account switched");
        self.connection(uid)
            .ok_or_else(|| StoreError::ConnectionNotFound(uid.clone()))
    }

    /// Select the chain new connections and `get_client(None)` use.
    pub fn set_chain_id(&self, chain_id: ChainId) -> Result<(), StoreError> {
        if !self.registry.clients().is_configured(&chain_id) {
            return Err(StoreError::ChainNotConfigured(chain_id));
        }
        self.update(|state| {
            (state.chain_id != chain_id).then(|| State {
                chain_id: chain_id.clone(),
                ..state.clone()
            })
        });
        Ok(())
    }

    /// Revalidate hydrated sessions.
    ///
    /// Each pending session is matched to a registered connector by id and
    /// re-connected with its persisted key fingerprint. Sessions that fail
    /// are dropped. Returns the uids that were restored.
    pub async fn reconnect(&self) -> Result<Vec<Uid>, StoreError> {
        let sessions = std::mem::take(&mut *self.pending.lock());
        let mut restored = Vec::new();

        if !sessions.is_empty() {
            self.update(|state| {
                (state.connections.is_empty() && state.status != ConnectionStatus::Reconnecting).then(|| State {
                    status: ConnectionStatus::Reconnecting,
                    ..state.clone()
                })
            });
        }

        for session in sessions {
            let Some(connector) = self.registry.find_by_id(&session.connector.id) else {
                warn!(id = %session.connector.id, "No registered connector for persisted session");
                continue;
            };
            let uid = connector.uid().clone();
            if self.phase(&uid) == ListenerPhase::Live {
                continue;
            }

            connector.on_connect(&session.chain_id, &session.username);
            let mut params = ConnectParameters::new(session.username.clone(), session.chain_id.clone());
            params.key_hash = session.key_hash;

            let result = connector.connect(params).await;
            self.process_events();

            match result {
                Ok(()) => {
                    if let Some(account) = session.account() {
                        self.update(|state| fold::select_account(state, &uid, &account.address));
                    }
                    info!(uid = %uid, username = %session.username, chain_id = %session.chain_id, "Session restored");
                    restored.push(uid);
                }
                Err(e) => {
                    warn!(uid = %uid, username = %session.username, error = %e, "Persisted session rejected");
                }
            }
        }

        self.settle(ConnectionStatus::Reconnecting);
        Ok(restored)
    }

    /// Register an EIP-6963 announced provider as a connector.
    ///
    /// Returns `None` when discovery is disabled or a connector with the
    /// same id already exists.
    pub fn add_discovered_provider(&self, detail: Eip6963ProviderDetail) -> Option<Arc<Connector>> {
        if !self.config.multi_injected_provider_discovery {
            debug!(rdns = detail.connector_id(), "Provider discovery disabled; announcement ignored");
            return None;
        }
        let connector = self.registry.add_discovered(detail);
        self.mark_discovery_loaded();
        connector
    }

    pub fn mark_discovery_loaded(&self) {
        self.update(|state| {
            (!state.mipd_loaded).then(|| State {
                mipd_loaded: true,
                ..state.clone()
            })
        });
    }

    // =========================================================================
    // Event folding
    // =========================================================================

    /// Drain the inbox and fold every queued event. Returns how many
    /// events changed the state.
    pub fn process_events(&self) -> usize {
        let mut transitions = Vec::new();
        let mut outcomes = Vec::new();
        {
            let _guard = self.fold_lock.lock();
            for envelope in self.registry.inbox().drain() {
                let uid = envelope.uid.clone();
                let kind = envelope.event.kind();
                match self.fold(envelope) {
                    Some(next) => {
                        transitions.push(self.commit(next));
                        outcomes.push((uid, kind, FoldOutcome::Applied));
                    }
                    None => outcomes.push((uid, kind, FoldOutcome::Dropped)),
                }
            }
        }

        for (uid, kind, outcome) in &outcomes {
            self.observers.notify_event(uid, *kind, *outcome);
        }
        for (current, previous) in &transitions {
            self.observers.notify(current, previous);
        }
        transitions.len()
    }

    /// Fold events as they arrive until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Config store event loop started");
        loop {
            self.process_events();
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = self.registry.inbox().wait() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        self.process_events();
        info!("Config store event loop stopped");
    }

    /// Track the attempt high-water mark; a `connect` from an attempt older
    /// than a folded `disconnect` or `connect` is superseded.
    fn superseded(&self, uid: &Uid, attempt: u64, event: &ConnectorEvent) -> bool {
        if !matches!(event, ConnectorEvent::Connect(_) | ConnectorEvent::Disconnect) {
            return false;
        }
        let mut attempts = self.attempts.lock();
        let seen = attempts.entry(uid.clone()).or_insert(0);
        if matches!(event, ConnectorEvent::Connect(_)) && attempt < *seen {
            debug!(uid = %uid, attempt, seen = *seen, "Superseded connect dropped");
            return true;
        }
        *seen = (*seen).max(attempt);
        false
    }

    /// Must be called with `fold_lock` held.
    fn fold(&self, envelope: Envelope) -> Option<State> {
        let Envelope { uid, attempt, event } = envelope;
        let Some(connector) = self.registry.get(&uid) else {
            debug!(uid = %uid, "Event from unregistered connector dropped");
            return None;
        };

        if self.superseded(&uid, attempt, &event) {
            return None;
        }

        let current = self.state();
        let mut live = self.live.lock();
        match event {
            ConnectorEvent::Connect(payload) => {
                if live.contains(&uid) {
                    debug!(uid = %uid, attempt, "Connect from live connector dropped");
                    return None;
                }
                live.insert(uid.clone());
                info!(
                    uid = %uid,
                    username = %payload.username,
                    chain_id = %payload.chain_id,
                    accounts = payload.accounts.len(),
                    "Connection established"
                );
                Some(fold::connect(&current, connector.info().clone(), payload))
            }
            ConnectorEvent::Change(payload) => {
                if !live.contains(&uid) {
                    debug!(uid = %uid, "Change for unconnected connector dropped");
                    return None;
                }
                let next = fold::change(&current, &uid, payload);
                if next.is_some() {
                    debug!(uid = %uid, "Connection changed");
                }
                next
            }
            ConnectorEvent::Disconnect => {
                if !live.remove(&uid) {
                    debug!(uid = %uid, "Disconnect for unconnected connector dropped");
                    return None;
                }
                info!(uid = %uid, "Connection closed");
                fold::disconnect(&current, &uid)
            }
            ConnectorEvent::Error { message } => {
                warn!(uid = %uid, error = %message, "Connector reported an error");
                None
            }
            ConnectorEvent::Message { kind, .. } => {
                debug!(uid = %uid, kind = %kind, "Connector message");
                None
            }
        }
    }

    /// Apply `f` to the current state under the fold lock and notify.
    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&State) -> Option<State>,
    {
        let transition = {
            let _guard = self.fold_lock.lock();
            let current = self.state();
            f(&current).map(|next| self.commit(next))
        };
        match transition {
            Some((current, previous)) => {
                self.observers.notify(&current, &previous);
                true
            }
            None => false,
        }
    }

    /// Return `status` to `disconnected` if it is still `from` with no
    /// connections.
    fn settle(&self, from: ConnectionStatus) {
        self.update(|state| {
            (state.connections.is_empty() && state.status == from).then(|| State {
                status: ConnectionStatus::Disconnected,
                ..state.clone()
            })
        });
    }

    /// Must be called with `fold_lock` held.
    fn commit(&self, next: State) -> Transition {
        let next = Arc::new(next);
        let previous = std::mem::replace(&mut *self.state.write(), next.clone());
        self.persist(&next);
        (next, previous)
    }

    fn persist(&self, state: &State) {
        let Some(persistence) = &self.persistence else {
            return;
        };

        let pending = self.pending.lock();
        let result = if pending.is_empty() {
            persistence.save(state)
        } else {
            let mut snapshot = state.clone();
            for session in pending.iter() {
                snapshot
                    .connections
                    .entry(session.uid().clone())
                    .or_insert_with(|| session.clone());
            }
            persistence.save(&snapshot)
        };

        if let Err(e) = result {
            warn!(key = persistence.key(), error = %e, "Failed to persist state");
        }
    }
}
