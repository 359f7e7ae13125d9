//! # Session State
//!
//! The only adapter-wide mutable state a connector keeps: which user and
//! chain it is seated on, and whether a key was proven for them.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use shared_types::{ChainId, KeyHash, Username};

/// User and chain a connector is seated on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: Username,
    pub chain_id: ChainId,
    pub key_hash: Option<KeyHash>,
}

#[derive(Debug, Default)]
pub struct SessionState {
    session: Mutex<Option<Session>>,
    authorized: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// Seat a session. Authorization is granted iff a key was proven.
    pub fn seat(&self, session: Session) {
        self.authorized.store(session.key_hash.is_some(), Ordering::SeqCst);
        *self.session.lock() = Some(session);
    }

    /// Re-seat user and chain, keeping any proven key.
    pub fn reseat(&self, username: Username, chain_id: ChainId) {
        let mut guard = self.session.lock();
        let key_hash = guard.as_ref().and_then(|s| s.key_hash);
        *guard = Some(Session {
            username,
            chain_id,
            key_hash,
        });
    }

    /// Move the seated session to another chain.
    pub fn switch_chain(&self, chain_id: ChainId) -> bool {
        match self.session.lock().as_mut() {
            Some(session) => {
                session.chain_id = chain_id;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.authorized.store(false, Ordering::SeqCst);
        *self.session.lock() = None;
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }
}
