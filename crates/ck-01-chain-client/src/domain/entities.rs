//! # Wire Entities
//!
//! Request and response shapes exchanged with the node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{AccountType, Addr, Binary, ChainId, Hash256};

/// `abci_query` result body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciQueryResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub log: String,
    /// Base64 response payload.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
}

/// Wrapper the node puts around `AbciQueryResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbciQueryResult {
    pub response: AbciQueryResponse,
}

/// `broadcast_tx_sync` result body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastTxResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub data: String,
    pub hash: String,
}

/// App-level query request, sent under path `/app`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryRequest {
    /// Chain info (chain id, last finalized block).
    Info {},
    /// Smart query against a contract.
    WasmSmart { contract: Addr, msg: Value },
}

/// App-level query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResponse {
    Info(ChainInfo),
    WasmSmart(Value),
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    #[serde_as(as = "DisplayFromStr")]
    pub height: u64,
    pub hash: Hash256,
}

/// Chain information returned by the `info` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    #[serde(default)]
    pub last_finalized_block: Option<BlockInfo>,
}

/// Outcome of a dry-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateOutcome {
    pub gas_used: u64,
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// A key registered to a username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Compressed secp256k1 public key.
    Secp256k1(Binary),
    /// SEC1 secp256r1 public key (passkey).
    Secp256r1(Binary),
    /// Ethereum address controlling the account.
    Ethereum(Addr),
}

/// Account record as stored by the account factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub index: u32,
    /// Single-entry map from account type to its parameters.
    pub params: BTreeMap<AccountTypeKey, Value>,
}

/// Map key wrapper so `AccountType` can key a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTypeKey {
    Spot,
    Margin,
    Multi,
}

impl From<AccountTypeKey> for AccountType {
    fn from(key: AccountTypeKey) -> Self {
        match key {
            AccountTypeKey::Spot => AccountType::Spot,
            AccountTypeKey::Margin => AccountType::Margin,
            AccountTypeKey::Multi => AccountType::Multi,
        }
    }
}

impl From<AccountType> for AccountTypeKey {
    fn from(kind: AccountType) -> Self {
        match kind {
            AccountType::Spot => AccountTypeKey::Spot,
            AccountType::Margin => AccountTypeKey::Margin,
            AccountType::Multi => AccountTypeKey::Multi,
        }
    }
}

impl AccountInfo {
    /// Account type tag, from the first (only) params key.
    pub fn account_type(&self) -> Option<AccountType> {
        self.params.keys().next().copied().map(AccountType::from)
    }
}

/// Subset of an account contract's `state` query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub sequence: u32,
}
