//! # Kit Configuration
//!
//! Unified configuration for every connect-kit component.
//!
//! `from_env` starts from the defaults and overlays `CK_*` variables onto
//! the first configured chain:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CK_CHAIN_ID` | chain id of the first chain, and the store's default chain |
//! | `CK_RPC_URL` | JSON-RPC endpoint of the first chain |
//! | `CK_ACCOUNT_FACTORY` | account factory address (`0x`-prefixed hex) |
//! | `CK_ACCOUNT_CODE_HASH` | account code hash (hex) |
//! | `CK_STORAGE_DIR` | directory for persisted sessions |
//! | `CK_GAS_BASE` | gas added to simulated usage |
//! | `CK_GAS_SCALE` | multiplier applied after the base is added |

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use ck_01_chain_client::{ChainConfig, TransportConfig};
use ck_02_connectors::ConnectorConfig;
use ck_03_config_store::StoreConfig;
use ck_04_signing_pipeline::PipelineConfig;
use connect_telemetry::TelemetryConfig;
use shared_types::{Addr, ChainId, Hash256};
use thiserror::Error;

/// Complete kit configuration.
#[derive(Debug, Clone)]
pub struct KitConfig {
    /// Chains the kit can talk to. The first one receives `CK_*` overrides.
    pub chains: Vec<ChainConfig>,
    pub transport: TransportConfig,
    pub connectors: ConnectorConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            chains: vec![ChainConfig::default()],
            transport: TransportConfig::default(),
            connectors: ConnectorConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
            telemetry: TelemetryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Where sessions are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Session directory. `None` keeps sessions in memory only.
    pub dir: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no chains configured")]
    NoChains,

    #[error("chain {0} is configured more than once")]
    DuplicateChain(ChainId),

    #[error("default chain {0} is not among the configured chains")]
    UnknownDefaultChain(ChainId),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl KitConfig {
    /// Defaults overlaid with `CK_*` and telemetry environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Defaults overlaid with the `CK_*` values `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let chain = &mut config.chains[0];

        if let Some(chain_id) = lookup("CK_CHAIN_ID") {
            chain.chain_id = ChainId::new(chain_id.clone());
            config.store.default_chain_id = ChainId::new(chain_id);
        }
        if let Some(url) = lookup("CK_RPC_URL") {
            chain.rpc_url = url;
        }
        if let Some(factory) = lookup("CK_ACCOUNT_FACTORY") {
            chain.account_factory = Some(parse("CK_ACCOUNT_FACTORY", &factory)?);
        }
        if let Some(code_hash) = lookup("CK_ACCOUNT_CODE_HASH") {
            chain.account_code_hash = Some(parse::<Hash256>("CK_ACCOUNT_CODE_HASH", &code_hash)?);
        }
        if let Some(dir) = lookup("CK_STORAGE_DIR") {
            config.storage.dir = Some(PathBuf::from(dir));
        }
        if let Some(base) = lookup("CK_GAS_BASE") {
            config.pipeline.gas.base = parse("CK_GAS_BASE", &base)?;
        }
        if let Some(scale) = lookup("CK_GAS_SCALE") {
            config.pipeline.gas.scale = parse("CK_GAS_SCALE", &scale)?;
        }

        Ok(config)
    }

    /// In-memory kit on the given test chains. The first is the default.
    pub fn for_testing(chain_ids: &[&str]) -> Self {
        let default_chain = chain_ids.first().copied().unwrap_or("dev-1");
        Self {
            chains: chain_ids.iter().map(|id| ChainConfig::for_testing(id)).collect(),
            transport: TransportConfig::default(),
            connectors: ConnectorConfig::for_testing(),
            store: StoreConfig::for_testing(default_chain),
            pipeline: PipelineConfig::for_testing(),
            telemetry: TelemetryConfig::for_testing(),
            storage: StorageConfig::default(),
        }
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - `NoChains` if the chain set is empty
    /// - `DuplicateChain` if a chain id appears twice
    /// - `UnknownDefaultChain` if the store's default chain is not configured
    /// - `InvalidValue` for a non-positive or non-finite gas scale
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chains.is_empty() {
            return Err(ConfigError::NoChains);
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(&chain.chain_id) {
                return Err(ConfigError::DuplicateChain(chain.chain_id.clone()));
            }
        }

        if !seen.contains(&self.store.default_chain_id) {
            return Err(ConfigError::UnknownDefaultChain(self.store.default_chain_id.clone()));
        }

        let scale = self.pipeline.gas.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "gas.scale",
                reason: format!("{scale} is not a positive number"),
            });
        }

        Ok(())
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}
