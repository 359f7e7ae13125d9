//! # Persistence Adapter
//!
//! Versioned envelope `{ "state": …, "version": n }` under one key.
//!
//! Loading never fails: unreadable or corrupted payloads are logged and
//! replaced by the initial state. The persisted `status` is always dropped
//! and the chain id is re-validated against the configured chains.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ChainId;
use tracing::{debug, warn};

use crate::domain::errors::PersistenceError;
use crate::domain::state::{PersistedState, State};
use crate::ports::outbound::Storage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope {
    pub state: Value,
    pub version: u32,
}

pub struct PersistenceAdapter {
    storage: Arc<dyn Storage>,
    key: String,
    version: u32,
    chain_ids: Vec<ChainId>,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>, version: u32, chain_ids: Vec<ChainId>) -> Self {
        Self {
            storage,
            key: key.into(),
            version,
            chain_ids,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `persisted.chainId` if it is a configured chain, else `fallback`.
    fn validated_chain_id(&self, persisted: &Value, fallback: &ChainId) -> ChainId {
        persisted
            .get("chainId")
            .and_then(Value::as_str)
            .map(ChainId::new)
            .filter(|chain_id| self.chain_ids.contains(chain_id))
            .unwrap_or_else(|| fallback.clone())
    }

    /// Pass state of the current version through; reduce anything else to
    /// the initial state, carrying over a still-configured chain id.
    pub fn migrate(&self, state: Value, stored_version: u32, initial: &State) -> Value {
        if stored_version == self.version {
            return state;
        }

        debug!(stored_version, current = self.version, "Migrating persisted state");
        let chain_id = self.validated_chain_id(&state, &initial.chain_id);
        let fresh = PersistedState::from(&State {
            chain_id,
            ..initial.clone()
        });
        serde_json::to_value(fresh).unwrap_or(Value::Null)
    }

    /// Overlay persisted fields on `current`, minus `status`.
    pub fn merge(&self, persisted: Value, current: &State) -> State {
        let Value::Object(mut fields) = persisted else {
            return current.clone();
        };
        fields.remove("status");
        let chain_id = self.validated_chain_id(&Value::Object(fields.clone()), &current.chain_id);

        let Ok(Value::Object(mut merged)) = serde_json::to_value(current) else {
            return current.clone();
        };
        merged.extend(fields);

        match serde_json::from_value::<State>(Value::Object(merged)) {
            Ok(state) => State { chain_id, ..state },
            Err(e) => {
                warn!(error = %e, "Discarding corrupted persisted state");
                current.clone()
            }
        }
    }

    /// Read, migrate and merge the persisted state over `initial`.
    pub fn load(&self, initial: &State) -> State {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return initial.clone(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Persisted state unreadable");
                return initial.clone();
            }
        };

        let envelope: PersistedEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupted persisted envelope");
                return initial.clone();
            }
        };

        let migrated = self.migrate(envelope.state, envelope.version, initial);
        self.merge(migrated, initial)
    }

    /// Write the persisted projection of `state`.
    pub fn save(&self, state: &State) -> Result<(), PersistenceError> {
        let envelope = PersistedEnvelope {
            state: serde_json::to_value(PersistedState::from(state))?,
            version: self.version,
        };
        self.storage.set_item(&self.key, &serde_json::to_string(&envelope)?)
    }

    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.storage.remove_item(&self.key)
    }
}
