//! # Store Configuration

use serde::{Deserialize, Serialize};
use shared_types::ChainId;

/// Storage key the store persists under by default.
pub const DEFAULT_STORAGE_KEY: &str = "connect-kit.store";

/// Current persisted schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Chain selected when nothing valid was persisted.
    pub default_chain_id: ChainId,
    /// Namespaced key of the persisted envelope.
    pub storage_key: String,
    pub schema_version: u32,
    /// Accept EIP-6963 provider announcements.
    pub multi_injected_provider_discovery: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_chain_id: ChainId::new("dev-1"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            schema_version: SCHEMA_VERSION,
            multi_injected_provider_discovery: true,
        }
    }
}

impl StoreConfig {
    pub fn for_testing(default_chain_id: &str) -> Self {
        Self {
            default_chain_id: ChainId::new(default_chain_id),
            storage_key: "connect-kit.test".to_string(),
            ..Self::default()
        }
    }
}
