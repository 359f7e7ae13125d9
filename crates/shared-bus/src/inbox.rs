//! # Event Inbox
//!
//! Receiving side: one queue per connector, multiplexed with a
//! `StreamMap`. Draining never blocks; `wait` parks until some emitter
//! has sent.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use shared_types::Uid;
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{StreamExt, StreamMap};
use tracing::debug;

use crate::emitter::Emitter;
use crate::events::Envelope;

/// Multiplexer over every attached connector queue.
pub struct EventInbox {
    streams: Mutex<StreamMap<Uid, UnboundedReceiverStream<Envelope>>>,
    notify: Arc<Notify>,
}

impl Default for EventInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl EventInbox {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(StreamMap::new()),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Open a queue for `uid` and return its emitter.
    ///
    /// Attaching the same uid again replaces the previous queue; emitters
    /// of the old queue start failing with `EmitError::Closed`.
    pub fn attach(&self, uid: Uid) -> Emitter {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.streams
            .lock()
            .insert(uid.clone(), UnboundedReceiverStream::new(receiver));
        debug!(uid = %uid, "Connector queue attached");
        Emitter::new(uid, sender, Arc::clone(&self.notify))
    }

    /// Close the queue of `uid`. Returns whether it was attached.
    pub fn detach(&self, uid: &Uid) -> bool {
        self.streams.lock().remove(uid).is_some()
    }

    /// Number of attached queues.
    pub fn len(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every event that is ready now.
    pub fn drain(&self) -> Vec<Envelope> {
        let mut streams = self.streams.lock();
        let mut ready = Vec::new();
        // `StreamMap::next` yields `None` once every queue is closed, and
        // stays pending while open queues are empty.
        while let Some(Some((_, envelope))) = streams.next().now_or_never() {
            ready.push(envelope);
        }
        ready
    }

    /// Wait until an emitter has sent since the last wake-up.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChangePayload, ConnectorEvent};
    use std::time::Duration;

    #[test]
    fn test_drain_empty_inbox() {
        let inbox = EventInbox::new();
        assert!(inbox.drain().is_empty());
        let _emitter = inbox.attach(Uid::new("a"));
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_per_connector_order_is_preserved() {
        let inbox = EventInbox::new();
        let a = inbox.attach(Uid::new("a"));
        let b = inbox.attach(Uid::new("b"));

        a.emit_change(ChangePayload::default()).unwrap();
        b.emit_error("b failed").unwrap();
        a.emit_disconnect().unwrap();

        let drained = inbox.drain();
        assert_eq!(drained.len(), 3);

        let from_a: Vec<_> = drained
            .iter()
            .filter(|e| e.uid == Uid::new("a"))
            .map(|e| e.event.kind())
            .collect();
        assert_eq!(
            from_a,
            vec![
                crate::EventKind::Change,
                crate::EventKind::Disconnect
            ]
        );
    }

    #[test]
    fn test_detach_closes_emitter() {
        let inbox = EventInbox::new();
        let a = inbox.attach(Uid::new("a"));
        assert!(inbox.detach(&Uid::new("a")));
        assert!(a.emit_disconnect().is_err());
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn test_wait_wakes_on_emit() {
        let inbox = Arc::new(EventInbox::new());
        let emitter = inbox.attach(Uid::new("a"));

        let waiter = {
            let inbox = Arc::clone(&inbox);
            tokio::spawn(async move {
                inbox.wait().await;
                inbox.drain()
            })
        };

        emitter.emit_disconnect().unwrap();
        let drained = tokio::time::timeout(Duration::from_millis(500), waiter)
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].event, ConnectorEvent::Disconnect);
    }
}
