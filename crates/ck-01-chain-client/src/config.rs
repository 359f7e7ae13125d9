//! # Chain Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::{Addr, ChainId, Hash256};

/// Static description of one configured chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    /// Display name.
    pub name: String,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Account factory contract (username → keys/accounts lookups).
    pub account_factory: Option<Addr>,
    /// Code hash of user account contracts, for address prediction.
    pub account_code_hash: Option<Hash256>,
    /// Use `chain_id` as the client's pinned id instead of querying it.
    pub pin_chain_id: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: ChainId::new("dev-1"),
            name: "Devnet".to_string(),
            rpc_url: "http://localhost:26657".to_string(),
            account_factory: None,
            account_code_hash: None,
            pin_chain_id: true,
        }
    }
}

impl ChainConfig {
    /// Config with a fixed factory and code hash, for tests.
    pub fn for_testing(chain_id: &str) -> Self {
        Self {
            chain_id: ChainId::new(chain_id),
            name: format!("Test {chain_id}"),
            rpc_url: "http://127.0.0.1:26657".to_string(),
            account_factory: Some(Addr([0xfa; 20])),
            account_code_hash: Some(Hash256([0xc0; 32])),
            pin_chain_id: true,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(2),
        }
    }
}
