//! # Store State
//!
//! The single source of truth and its persisted projection.
//!
//! ## Invariants
//!
//! - `status == Connected` iff `connections` is non-empty
//! - every value of `connectors` is a key of `connections`
//! - every connection is keyed by its connector's uid
//! - a connection's active index points into its accounts

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_bus::ConnectPayload;
use shared_types::{Account, ChainId, ConnectionStatus, ConnectorInfo, KeyHash, Uid, Username};

/// A live session of one connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Serializable reduction of the connector.
    pub connector: ConnectorInfo,
    pub chain_id: ChainId,
    pub username: Username,
    pub accounts: Vec<Account>,
    /// Index of the active account in `accounts`.
    #[serde(default)]
    pub active: usize,
    #[serde(default)]
    pub key_hash: Option<KeyHash>,
}

impl Connection {
    pub fn new(connector: ConnectorInfo, payload: ConnectPayload) -> Self {
        Self {
            connector,
            chain_id: payload.chain_id,
            username: payload.username,
            accounts: payload.accounts,
            active: 0,
            key_hash: payload.key_hash,
        }
    }

    pub fn uid(&self) -> &Uid {
        &self.connector.uid
    }

    /// The active account.
    pub fn account(&self) -> Option<&Account> {
        self.accounts.get(self.active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub chain_id: ChainId,
    pub connections: BTreeMap<Uid, Connection>,
    /// Chain id → uid of the connector active on that chain.
    pub connectors: BTreeMap<ChainId, Uid>,
    pub status: ConnectionStatus,
    /// Whether EIP-6963 discovery has delivered (or is disabled).
    #[serde(rename = "isMipdLoaded")]
    pub mipd_loaded: bool,
}

impl State {
    pub fn initial(chain_id: ChainId, mipd_loaded: bool) -> Self {
        Self {
            chain_id,
            connections: BTreeMap::new(),
            connectors: BTreeMap::new(),
            status: ConnectionStatus::Disconnected,
            mipd_loaded,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Connection of the connector mapped to `chain_id`.
    pub fn connection_for_chain(&self, chain_id: &ChainId) -> Option<&Connection> {
        self.connectors
            .get(chain_id)
            .and_then(|uid| self.connections.get(uid))
    }

    /// Describe the first broken invariant, if any.
    pub fn check_invariants(&self) -> Result<(), String> {
        let connected = self.status == ConnectionStatus::Connected;
        if connected == self.connections.is_empty() {
            return Err(format!(
                "status {} with {} connections",
                self.status,
                self.connections.len()
            ));
        }
        for (chain_id, uid) in &self.connectors {
            if !self.connections.contains_key(uid) {
                return Err(format!("chain {chain_id} mapped to unknown connection {uid}"));
            }
        }
        for (uid, connection) in &self.connections {
            if connection.uid() != uid {
                return Err(format!("connection {} stored under {uid}", connection.uid()));
            }
            if !connection.accounts.is_empty() && connection.active >= connection.accounts.len() {
                return Err(format!("active account out of range in {uid}"));
            }
        }
        Ok(())
    }
}

/// What is written to storage: connector objects reduced to
/// `{id, name, type, uid}`, no discovery flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub chain_id: ChainId,
    pub status: ConnectionStatus,
    pub connectors: BTreeMap<ChainId, Uid>,
    pub connections: BTreeMap<Uid, Connection>,
}

impl From<&State> for PersistedState {
    fn from(state: &State) -> Self {
        Self {
            chain_id: state.chain_id.clone(),
            status: state.status,
            connectors: state.connectors.clone(),
            connections: state.connections.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::ConnectorKind;

    #[test]
    fn test_initial_state_is_consistent() {
        let state = State::initial("dev-1".into(), false);
        assert!(state.check_invariants().is_ok());
        assert!(!state.is_connected());
    }

    #[test]
    fn test_connected_without_connections_is_invalid() {
        let mut state = State::initial("dev-1".into(), false);
        state.status = ConnectionStatus::Connected;
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_dangling_chain_mapping_is_invalid() {
        let mut state = State::initial("dev-1".into(), false);
        state.connectors.insert("dev-1".into(), Uid::new("ghost"));
        let err = state.check_invariants().unwrap_err();
        assert!(err.contains("ghost"));
    }

    #[test]
    fn test_persisted_shape_uses_camel_case() {
        let mut state = State::initial("dev-1".into(), true);
        let info = ConnectorInfo {
            id: "passkey".into(),
            name: "Passkey".into(),
            kind: ConnectorKind::Passkey,
            uid: Uid::new("u1"),
        };
        state.connections.insert(
            Uid::new("u1"),
            Connection {
                connector: info,
                chain_id: "dev-1".into(),
                username: "alice".into(),
                accounts: vec![],
                active: 0,
                key_hash: None,
            },
        );
        state.status = ConnectionStatus::Connected;

        let value = serde_json::to_value(PersistedState::from(&state)).unwrap();
        assert_eq!(value["chainId"], "dev-1");
        assert_eq!(value["status"], "connected");
        assert_eq!(value["connections"]["u1"]["connector"]["type"], "passkey");
        assert!(value.get("isMipdLoaded").is_none());
        assert_eq!(value["connections"]["u1"]["keyHash"], json!(null));
    }
}
