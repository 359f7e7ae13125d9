//! # Pipeline Entities

use shared_types::{Addr, ChainId, Hash256, Message, Tx, Uid};

/// Input of `sign_and_broadcast`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignAndBroadcast {
    /// Connector to sign with. Defaults to the one active on the current chain.
    pub uid: Option<Uid>,
    /// Defaults to the connection's active account.
    pub sender: Option<Addr>,
    pub msgs: Vec<Message>,
    /// Explicit limit. Skips simulation.
    pub gas_limit: Option<u64>,
}

impl SignAndBroadcast {
    pub fn new(msgs: Vec<Message>) -> Self {
        Self {
            uid: None,
            sender: None,
            msgs,
            gas_limit: None,
        }
    }

    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_sender(mut self, sender: Addr) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// An accepted broadcast. Inclusion in a block is not awaited.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastOutcome {
    pub hash: String,
    pub chain_id: ChainId,
    pub sign_bytes: Hash256,
    /// The sender's sequence could not be read and 0 was used.
    pub sequence_fallback: bool,
    pub tx: Tx,
}
