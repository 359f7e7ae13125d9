//! # EIP-6963 Provider Discovery
//!
//! Wallets announce themselves with `{uuid, name, icon, rdns}`. Each
//! announcement becomes an EIP-1193 connector whose id is the `rdns`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connector::ConnectorSpec;
use crate::ports::outbound::Eip1193Provider;

/// Metadata of an announced provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip6963ProviderInfo {
    pub uuid: String,
    pub name: String,
    /// Data URI.
    pub icon: String,
    /// Reverse-DNS identifier, e.g. `io.metamask`.
    pub rdns: String,
}

/// An announcement: metadata plus the provider handle.
#[derive(Clone)]
pub struct Eip6963ProviderDetail {
    pub info: Eip6963ProviderInfo,
    pub provider: Arc<dyn Eip1193Provider>,
}

impl fmt::Debug for Eip6963ProviderDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eip6963ProviderDetail").field("info", &self.info).finish()
    }
}

impl Eip6963ProviderDetail {
    pub fn new(info: Eip6963ProviderInfo, provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { info, provider }
    }

    pub fn connector_id(&self) -> &str {
        &self.info.rdns
    }

    pub fn into_spec(self) -> ConnectorSpec {
        ConnectorSpec::eip1193(self.info.rdns, self.info.name, Some(self.provider)).with_icon(self.info.icon)
    }
}
