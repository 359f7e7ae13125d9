//! # Connector Configuration

use serde::{Deserialize, Serialize};

/// Challenge signed by `create_new_key` when the caller supplies none.
pub const DEFAULT_KEY_CHALLENGE: &str = "Please sign this message to confirm your identity.";

/// Settings shared by every connector instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// EIP-712 domain name and WebAuthn relying-party id.
    pub app_domain: String,
    /// Challenge used by `create_new_key` by default.
    pub default_challenge: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            app_domain: "localhost".to_string(),
            default_challenge: DEFAULT_KEY_CHALLENGE.to_string(),
        }
    }
}

impl ConnectorConfig {
    pub fn for_testing() -> Self {
        Self {
            app_domain: "connect-kit.test".to_string(),
            ..Self::default()
        }
    }
}
