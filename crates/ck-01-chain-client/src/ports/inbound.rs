//! # Inbound Ports (Driving Ports / API)
//!
//! The chain operations connectors and the signing pipeline rely on.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Account, Addr, ChainId, KeyHash, Tx, UnsignedTx, Username};

use crate::domain::entities::{BroadcastTxResponse, ChainInfo, Key, QueryRequest, QueryResponse, SimulateOutcome};
use crate::domain::errors::ChainClientError;

/// Primary chain API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Chain id fixed at construction, if any.
    fn pinned_chain_id(&self) -> Option<&ChainId>;

    /// Raw app query under path `/app`.
    async fn query_app(&self, request: &QueryRequest) -> Result<QueryResponse, ChainClientError>;

    /// Chain info (includes the chain id).
    async fn query_info(&self) -> Result<ChainInfo, ChainClientError>;

    /// Smart query against a contract.
    async fn query_wasm_smart(&self, contract: &Addr, msg: Value) -> Result<Value, ChainClientError>;

    /// Sequence number of an account contract.
    async fn account_sequence(&self, address: &Addr) -> Result<u32, ChainClientError>;

    /// Keys registered to `username`, keyed by fingerprint.
    async fn keys_by_username(
        &self,
        username: &Username,
    ) -> Result<BTreeMap<KeyHash, Key>, ChainClientError>;

    /// Accounts owned by `username`, ordered by address.
    async fn accounts_by_username(&self, username: &Username) -> Result<Vec<Account>, ChainClientError>;

    /// Dry-run an unsigned transaction.
    async fn simulate(&self, tx: &UnsignedTx) -> Result<SimulateOutcome, ChainClientError>;

    /// Submit a signed transaction and return the raw check result.
    ///
    /// A non-zero `code` is not turned into an error here.
    async fn broadcast_tx_sync(&self, tx: &Tx) -> Result<BroadcastTxResponse, ChainClientError>;
}
