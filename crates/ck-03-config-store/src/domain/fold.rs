//! # Event Folds
//!
//! Pure transitions from one `State` to the next. Each fold reads the old
//! state and builds a new one from copies; nothing is mutated in place.
//! Folds returning `None` are no-ops.

use shared_bus::{ChangePayload, ConnectPayload};
use shared_types::{Addr, ConnectionStatus, ConnectorInfo, Uid};

use crate::domain::state::{Connection, State};

/// Upsert the connection, map its chain to it and mark the store connected.
pub fn connect(state: &State, connector: ConnectorInfo, payload: ConnectPayload) -> State {
    let uid = connector.uid.clone();
    let chain_id = payload.chain_id.clone();

    let mut connections = state.connections.clone();
    connections.insert(uid.clone(), Connection::new(connector, payload));

    let mut connectors = state.connectors.clone();
    connectors.retain(|_, mapped| *mapped != uid);
    connectors.insert(chain_id.clone(), uid);

    State {
        chain_id,
        connections,
        connectors,
        status: ConnectionStatus::Connected,
        mipd_loaded: state.mipd_loaded,
    }
}

/// Apply the fields present in `payload` to an existing connection.
pub fn change(state: &State, uid: &Uid, payload: ChangePayload) -> Option<State> {
    let current = state.connections.get(uid)?;
    let mut next = current.clone();

    if let Some(username) = payload.username {
        next.username = username;
    }
    if let Some(accounts) = payload.accounts {
        // Keep the active account if it survived the change.
        let active = current
            .account()
            .and_then(|a| accounts.iter().position(|b| b.address == a.address))
            .unwrap_or(0);
        next.accounts = accounts;
        next.active = active;
    }
    if let Some(key_hash) = payload.key_hash {
        next.key_hash = Some(key_hash);
    }

    let mut connectors = state.connectors.clone();
    if let Some(chain_id) = payload.chain_id {
        connectors.retain(|_, mapped| mapped != uid);
        connectors.insert(chain_id.clone(), uid.clone());
        next.chain_id = chain_id;
    }

    let mut connections = state.connections.clone();
    connections.insert(uid.clone(), next);

    Some(State {
        connections,
        connectors,
        ..state.clone()
    })
}

/// Remove the connection and its chain mappings.
pub fn disconnect(state: &State, uid: &Uid) -> Option<State> {
    if !state.connections.contains_key(uid) {
        return None;
    }

    let mut connections = state.connections.clone();
    connections.remove(uid);

    if connections.is_empty() {
        return Some(State::initial(state.chain_id.clone(), state.mipd_loaded));
    }

    let mut connectors = state.connectors.clone();
    connectors.retain(|_, mapped| mapped != uid);

    Some(State {
        connections,
        connectors,
        ..state.clone()
    })
}

/// Point the connection's active account at `address`.
pub fn select_account(state: &State, uid: &Uid, address: &Addr) -> Option<State> {
    let current = state.connections.get(uid)?;
    let index = current.accounts.iter().position(|a| a.address == *address)?;

    let mut connections = state.connections.clone();
    connections.insert(
        uid.clone(),
        Connection {
            active: index,
            ..current.clone()
        },
    );

    Some(State {
        connections,
        ..state.clone()
    })
}
