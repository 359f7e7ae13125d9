//! # Emitter
//!
//! Sending half of a connector's event queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::Uid;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

use crate::events::{ChangePayload, ConnectPayload, ConnectorEvent, Envelope};

/// Errors from emitting an event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The inbox was dropped or the connector was detached.
    #[error("Event inbox closed")]
    Closed,

    /// A newer attempt (or a disconnect) superseded this connect attempt.
    #[error("Stale connect attempt {attempt}, current is {current}")]
    Stale { attempt: u64, current: u64 },
}

/// Ticket identifying one connect ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTicket(pub u64);

/// Connector-scoped publisher.
///
/// Cloning yields another handle onto the same queue and attempt counter.
/// Bumping the counter and enqueueing happen under one gate, so a
/// `connect` that passed its attempt check is always queued ahead of the
/// `disconnect` that supersedes it.
#[derive(Debug, Clone)]
pub struct Emitter {
    uid: Uid,
    sender: mpsc::UnboundedSender<Envelope>,
    attempts: Arc<AtomicU64>,
    gate: Arc<Mutex<()>>,
    notify: Arc<Notify>,
}

impl Emitter {
    pub(crate) fn new(uid: Uid, sender: mpsc::UnboundedSender<Envelope>, notify: Arc<Notify>) -> Self {
        Self {
            uid,
            sender,
            attempts: Arc::new(AtomicU64::new(0)),
            gate: Arc::new(Mutex::new(())),
            notify,
        }
    }

    /// Uid of the owning connector.
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Current attempt number.
    pub fn current_attempt(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Start a new connect attempt, superseding any in flight.
    pub fn begin_attempt(&self) -> AttemptTicket {
        let _gate = self.gate.lock();
        AttemptTicket(self.attempts.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Emit `connect` for `ticket`.
    ///
    /// # Errors
    ///
    /// `EmitError::Stale` if another attempt started or the connector was
    /// disconnected since the ticket was taken. Nothing is emitted then.
    pub fn emit_connect(&self, ticket: AttemptTicket, payload: ConnectPayload) -> Result<(), EmitError> {
        let _gate = self.gate.lock();
        let current = self.current_attempt();
        if current != ticket.0 {
            debug!(uid = %self.uid, attempt = ticket.0, current, "Dropping stale connect emission");
            return Err(EmitError::Stale {
                attempt: ticket.0,
                current,
            });
        }
        self.send(ticket.0, ConnectorEvent::Connect(payload))
    }

    pub fn emit_change(&self, payload: ChangePayload) -> Result<(), EmitError> {
        self.send(self.current_attempt(), ConnectorEvent::Change(payload))
    }

    /// Emit `disconnect` and invalidate any connect attempt in flight.
    pub fn emit_disconnect(&self) -> Result<(), EmitError> {
        let _gate = self.gate.lock();
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(attempt, ConnectorEvent::Disconnect)
    }

    pub fn emit_error(&self, message: impl Into<String>) -> Result<(), EmitError> {
        self.send(
            self.current_attempt(),
            ConnectorEvent::Error {
                message: message.into(),
            },
        )
    }

    pub fn emit_message(&self, kind: impl Into<String>, data: serde_json::Value) -> Result<(), EmitError> {
        self.send(
            self.current_attempt(),
            ConnectorEvent::Message {
                kind: kind.into(),
                data,
            },
        )
    }

    fn send(&self, attempt: u64, event: ConnectorEvent) -> Result<(), EmitError> {
        let kind = event.kind();
        self.sender
            .send(Envelope {
                uid: self.uid.clone(),
                attempt,
                event,
            })
            .map_err(|_| EmitError::Closed)?;
        self.notify.notify_one();
        debug!(uid = %self.uid, event = kind.as_str(), "Connector event emitted");
        Ok(())
    }
}
