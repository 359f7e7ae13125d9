//! # Shared Bus - Connector Event Channels
//!
//! Every connector owns an [`Emitter`]: the sending half of its own typed
//! queue. The config store owns the single [`EventInbox`] that multiplexes
//! all of those queues and folds what they carry into state.
//!
//! ```text
//! ┌─────────────┐  emit_connect()   ┌──────────────┐
//! │ Connector A │ ────────────────→ │              │
//! └─────────────┘                   │  EventInbox  │ drain() ──→ ConfigStore folds
//! ┌─────────────┐  emit_change()    │  (StreamMap) │
//! │ Connector B │ ────────────────→ │              │
//! └─────────────┘                   └──────────────┘
//! ```
//!
//! ## Ordering
//!
//! - Events from one connector are delivered in emission order.
//! - Events from different connectors interleave; whichever is emitted
//!   first is eligible to be folded first.
//!
//! ## Stale Connects
//!
//! Each emitter keeps a monotonic attempt counter. A connect ceremony takes
//! a ticket with [`Emitter::begin_attempt`]; `emit_disconnect` bumps the
//! counter, so a ceremony still in flight when the connector is
//! disconnected can no longer emit `connect`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod emitter;
pub mod events;
pub mod inbox;

pub use emitter::{AttemptTicket, EmitError, Emitter};
pub use events::{ChangePayload, ConnectPayload, ConnectorEvent, Envelope, EventKind};
pub use inbox::EventInbox;
