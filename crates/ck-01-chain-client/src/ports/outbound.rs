//! # Outbound Ports
//!
//! The RPC transport this crate drives, plus an in-memory chain double.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_types::{AccountType, Addr, ChainId, KeyHash, Tx, Username};

use crate::domain::entities::{
    AbciQueryResponse, AccountInfo, AccountTypeKey, BroadcastTxResponse, ChainInfo, Key, QueryRequest, QueryResponse,
    SimulateOutcome,
};
use crate::domain::errors::TransportError;

/// Opaque JSON-RPC transport.
///
/// Framing, batching and retries are the transport's concern.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Issue one JSON-RPC call and return its `result`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mutable state behind `MockChain`.
#[derive(Debug, Clone, Default)]
pub struct MockChainState {
    pub chain_id: ChainId,
    pub factory: Addr,
    /// Registered account sequences. Unknown accounts answer with code 1.
    pub sequences: HashMap<Addr, u32>,
    pub keys: HashMap<Username, BTreeMap<KeyHash, Key>>,
    pub accounts: HashMap<Username, BTreeMap<Addr, AccountInfo>>,
    pub simulate_gas_used: u64,
    /// Code/codespace/log returned by `broadcast_tx_sync`.
    pub broadcast_code: u32,
    pub broadcast_codespace: String,
    pub broadcast_log: String,
    /// Make the info query fail at the transport level.
    pub fail_info: bool,
    /// Make account `state` queries fail at the transport level.
    pub fail_sequence: bool,
    /// Make every request fail at the transport level.
    pub offline: bool,
    /// Decoded transactions received by `broadcast_tx_sync`.
    pub broadcasts: Vec<Tx>,
    /// JSON-RPC methods (with ABCI path) in call order.
    pub calls: Vec<String>,
}

/// In-memory chain speaking the node's JSON-RPC dialect.
#[derive(Debug, Default)]
pub struct MockChain {
    pub state: Mutex<MockChainState>,
}

impl MockChain {
    pub fn new(chain_id: &str, factory: Addr) -> Self {
        Self {
            state: Mutex::new(MockChainState {
                chain_id: ChainId::new(chain_id),
                factory,
                simulate_gas_used: 100_000,
                ..Default::default()
            }),
        }
    }

    pub fn register_key(&self, username: &str, key_hash: KeyHash, key: Key) {
        self.state
            .lock()
            .keys
            .entry(Username::new(username))
            .or_default()
            .insert(key_hash, key);
    }

    pub fn register_account(&self, username: &str, address: Addr, index: u32, account_type: AccountType) {
        let mut params: BTreeMap<AccountTypeKey, Value> = BTreeMap::new();
        params.insert(account_type.into(), json!({ "owner": username }));
        self.state
            .lock()
            .accounts
            .entry(Username::new(username))
            .or_default()
            .insert(address, AccountInfo { index, params });
    }

    pub fn set_sequence(&self, address: Addr, sequence: u32) {
        self.state.lock().sequences.insert(address, sequence);
    }

    pub fn set_broadcast_result(&self, code: u32, codespace: &str, log: &str) {
        let mut state = self.state.lock();
        state.broadcast_code = code;
        state.broadcast_codespace = codespace.to_string();
        state.broadcast_log = log.to_string();
    }

    pub fn broadcasts(&self) -> Vec<Tx> {
        self.state.lock().broadcasts.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn ok_value(value: &Value) -> Value {
        json!({
            "response": AbciQueryResponse {
                value: Some(STANDARD.encode(value.to_string())),
                height: Some("0".to_string()),
                ..Default::default()
            }
        })
    }

    fn failed(code: u32, codespace: &str, log: &str) -> Value {
        json!({
            "response": AbciQueryResponse {
                code,
                codespace: codespace.to_string(),
                log: log.to_string(),
                ..Default::default()
            }
        })
    }

    fn decode_data(params: &Value) -> Result<Value, TransportError> {
        let data = params["data"]
            .as_str()
            .ok_or_else(|| TransportError::Parse("missing data".to_string()))?;
        let bytes = hex::decode(data).map_err(|e| TransportError::Parse(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Parse(e.to_string()))
    }

    fn handle_app(state: &MockChainState, request: QueryRequest) -> Result<Value, TransportError> {
        match request {
            QueryRequest::Info {} => {
                if state.fail_info {
                    return Err(TransportError::Connection("info unavailable".to_string()));
                }
                let info = QueryResponse::Info(ChainInfo {
                    chain_id: state.chain_id.clone(),
                    last_finalized_block: None,
                });
                Ok(Self::ok_value(&json!(info)))
            }
            QueryRequest::WasmSmart { contract, msg } if contract == state.factory => {
                let username = |field: &str| Username::new(msg[field]["username"].as_str().unwrap_or_default());
                if msg.get("keys_by_user").is_some() {
                    let keys = state.keys.get(&username("keys_by_user")).cloned().unwrap_or_default();
                    Ok(Self::ok_value(&json!(QueryResponse::WasmSmart(json!(keys)))))
                } else if msg.get("accounts_by_user").is_some() {
                    let accounts = state
                        .accounts
                        .get(&username("accounts_by_user"))
                        .cloned()
                        .unwrap_or_default();
                    Ok(Self::ok_value(&json!(QueryResponse::WasmSmart(json!(accounts)))))
                } else {
                    Ok(Self::failed(1, "factory", "unknown query"))
                }
            }
            QueryRequest::WasmSmart { contract, .. } => {
                if state.fail_sequence {
                    return Err(TransportError::Connection("state unavailable".to_string()));
                }
                match state.sequences.get(&contract) {
                    Some(sequence) => Ok(Self::ok_value(&json!(QueryResponse::WasmSmart(
                        json!({ "sequence": sequence })
                    )))),
                    None => Ok(Self::failed(1, "app", &format!("contract {contract} not found"))),
                }
            }
        }
    }
}

#[async_trait]
impl RpcTransport for MockChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let mut state = self.state.lock();
        let path = params["path"].as_str().unwrap_or_default().to_string();
        state.calls.push(format!("{method}{path}"));

        if state.offline {
            return Err(TransportError::Connection("mock chain offline".to_string()));
        }

        match (method, path.as_str()) {
            ("abci_query", "/app") => {
                let request: QueryRequest = serde_json::from_value(Self::decode_data(&params)?)
                    .map_err(|e| TransportError::Parse(e.to_string()))?;
                Self::handle_app(&state, request)
            }
            ("abci_query", "/simulate") => {
                let outcome = SimulateOutcome {
                    gas_used: state.simulate_gas_used,
                    gas_limit: None,
                };
                Ok(Self::ok_value(&json!(outcome)))
            }
            ("broadcast_tx_sync", _) => {
                let encoded = params["tx"]
                    .as_str()
                    .ok_or_else(|| TransportError::Parse("missing tx".to_string()))?;
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|e| TransportError::Parse(e.to_string()))?;
                let tx: Tx = serde_json::from_slice(&bytes).map_err(|e| TransportError::Parse(e.to_string()))?;
                state.broadcasts.push(tx);

                Ok(json!(BroadcastTxResponse {
                    code: state.broadcast_code,
                    codespace: state.broadcast_codespace.clone(),
                    log: state.broadcast_log.clone(),
                    data: String::new(),
                    hash: format!("{:064X}", state.broadcasts.len()),
                }))
            }
            _ => Err(TransportError::Rpc {
                code: -32601,
                message: format!("method {method} not found"),
            }),
        }
    }
}
