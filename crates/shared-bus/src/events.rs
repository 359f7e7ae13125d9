//! # Connector Events
//!
//! The lifecycle events a connector publishes to the config store.

use serde::{Deserialize, Serialize};
use shared_types::{Account, ChainId, KeyHash, Uid, Username};

/// Payload of a successful connect ceremony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectPayload {
    pub username: Username,
    pub accounts: Vec<Account>,
    pub chain_id: ChainId,
    pub key_hash: Option<KeyHash>,
}

/// Partial update of an existing connection. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePayload {
    pub username: Option<Username>,
    pub accounts: Option<Vec<Account>>,
    pub chain_id: Option<ChainId>,
    pub key_hash: Option<KeyHash>,
}

/// A lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorEvent {
    Connect(ConnectPayload),
    Change(ChangePayload),
    Disconnect,
    Error { message: String },
    Message { kind: String, data: serde_json::Value },
}

/// Event kinds, for filtering and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Change,
    Disconnect,
    Error,
    Message,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Change => "change",
            Self::Disconnect => "disconnect",
            Self::Error => "error",
            Self::Message => "message",
        }
    }
}

impl ConnectorEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect(_) => EventKind::Connect,
            Self::Change(_) => EventKind::Change,
            Self::Disconnect => EventKind::Disconnect,
            Self::Error { .. } => EventKind::Error,
            Self::Message { .. } => EventKind::Message,
        }
    }
}

/// An event tagged with its source connector and the attempt it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub uid: Uid,
    pub attempt: u64,
    pub event: ConnectorEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_labels() {
        assert_eq!(ConnectorEvent::Disconnect.kind().as_str(), "disconnect");
        assert_eq!(
            ConnectorEvent::Change(ChangePayload::default()).kind(),
            EventKind::Change
        );
        let error = ConnectorEvent::Error {
            message: "boom".into(),
        };
        assert_eq!(error.kind(), EventKind::Error);
    }
}
