//! # Observer List
//!
//! Explicit subscriber list notified with `(current, previous)` after each
//! state replacement. Listeners run outside any store lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_bus::EventKind;
use shared_types::Uid;

use crate::domain::state::State;

/// Handle returned by `subscribe`; pass to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// What happened to a connector event in the fold loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// The event produced a new state.
    Applied,
    /// No-op: unknown uid, wrong listener phase, or informational event.
    Dropped,
}

impl FoldOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Dropped => "dropped",
        }
    }
}

type Listener = Arc<dyn Fn(&State, &State) + Send + Sync>;
type EventListener = Arc<dyn Fn(&Uid, EventKind, FoldOutcome) + Send + Sync>;

#[derive(Default)]
pub struct ObserverList {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    event_listeners: RwLock<Vec<EventListener>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&State, &State) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Notify only when the selected slice changes.
    pub fn subscribe_with_selector<T, S, F>(
        &self,
        selector: S,
        listener: F,
        fire_immediately: Option<&State>,
    ) -> SubscriptionId
    where
        T: PartialEq + Send + Sync + 'static,
        S: Fn(&State) -> T + Send + Sync + 'static,
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        if let Some(current) = fire_immediately {
            let selected = selector(current);
            listener(&selected, &selected);
        }

        self.subscribe(move |current, previous| {
            let next = selector(current);
            let prev = selector(previous);
            if next != prev {
                listener(&next, &prev);
            }
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listen to every folded event and its outcome.
    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&Uid, EventKind, FoldOutcome) + Send + Sync + 'static,
    {
        self.event_listeners.write().push(Arc::new(listener));
    }

    pub fn notify_event(&self, uid: &Uid, kind: EventKind, outcome: FoldOutcome) {
        let listeners: Vec<EventListener> = self.event_listeners.read().clone();
        for listener in listeners {
            listener(uid, kind, outcome);
        }
    }

    pub fn notify(&self, current: &State, previous: &State) {
        let listeners: Vec<Listener> = self.listeners.read().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(current, previous);
        }
    }
}
