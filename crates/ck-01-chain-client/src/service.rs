//! # Chain Client Service
//!
//! Implements `ChainApi` on top of an `RpcTransport`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared_types::{Account, Addr, ChainId, KeyHash, Tx, UnsignedTx, Username};
use tracing::debug;

use crate::config::ChainConfig;
use crate::domain::entities::{
    AbciQueryResult, AccountInfo, AccountState, BroadcastTxResponse, ChainInfo, Key, QueryRequest,
    QueryResponse, SimulateOutcome,
};
use crate::domain::errors::ChainClientError;
use crate::ports::inbound::ChainApi;
use crate::ports::outbound::RpcTransport;

const APP_PATH: &str = "/app";
const SIMULATE_PATH: &str = "/simulate";

/// Client bound to one chain endpoint.
#[derive(Clone)]
pub struct ChainClient {
    transport: Arc<dyn RpcTransport>,
    chain_id: Option<ChainId>,
    account_factory: Option<Addr>,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("chain_id", &self.chain_id)
            .field("account_factory", &self.account_factory)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Unpinned client without an account factory.
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            chain_id: None,
            account_factory: None,
        }
    }

    /// Client configured from a `ChainConfig`.
    pub fn from_config(config: &ChainConfig, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            chain_id: config.pin_chain_id.then(|| config.chain_id.clone()),
            account_factory: config.account_factory,
        }
    }

    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_account_factory(mut self, factory: Addr) -> Self {
        self.account_factory = Some(factory);
        self
    }

    pub fn account_factory(&self) -> Option<&Addr> {
        self.account_factory.as_ref()
    }

    fn factory(&self) -> Result<&Addr, ChainClientError> {
        self.account_factory.as_ref().ok_or_else(|| {
            ChainClientError::AccountFactoryNotConfigured(
                self.chain_id.as_ref().map(ToString::to_string).unwrap_or_default(),
            )
        })
    }

    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, ChainClientError> {
        let params = json!({
            "path": path,
            "data": hex::encode(data),
            "height": "0",
            "prove": false,
        });
        let result = self.transport.request("abci_query", params).await?;
        let AbciQueryResult { response } = decode(result)?;

        if response.code != 0 {
            debug!(path, code = response.code, codespace = %response.codespace, "ABCI query failed");
            return Err(ChainClientError::QueryFailed {
                codespace: response.codespace,
                code: response.code,
                log: response.log,
            });
        }

        match response.value {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map_err(|e| ChainClientError::UnexpectedResponse(e.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ChainClientError> {
    serde_json::from_value(value).map_err(|e| ChainClientError::UnexpectedResponse(e.to_string()))
}

fn decode_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ChainClientError> {
    serde_json::from_slice(bytes).map_err(|e| ChainClientError::UnexpectedResponse(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ChainClientError> {
    serde_json::to_vec(value).map_err(|e| ChainClientError::Encode(e.to_string()))
}

#[async_trait]
impl ChainApi for ChainClient {
    fn pinned_chain_id(&self) -> Option<&ChainId> {
        self.chain_id.as_ref()
    }

    async fn query_app(&self, request: &QueryRequest) -> Result<QueryResponse, ChainClientError> {
        let bytes = self.abci_query(APP_PATH, &encode(request)?).await?;
        decode_bytes(&bytes)
    }

    async fn query_info(&self) -> Result<ChainInfo, ChainClientError> {
        match self.query_app(&QueryRequest::Info {}).await? {
            QueryResponse::Info(info) => Ok(info),
            other => Err(ChainClientError::UnexpectedResponse(format!(
                "expected info, got {other:?}"
            ))),
        }
    }

    async fn query_wasm_smart(&self, contract: &Addr, msg: Value) -> Result<Value, ChainClientError> {
        let request = QueryRequest::WasmSmart {
            contract: *contract,
            msg,
        };
        match self.query_app(&request).await? {
            QueryResponse::WasmSmart(value) => Ok(value),
            other => Err(ChainClientError::UnexpectedResponse(format!(
                "expected wasm_smart, got {other:?}"
            ))),
        }
    }

    async fn account_sequence(&self, address: &Addr) -> Result<u32, ChainClientError> {
        let value = self.query_wasm_smart(address, json!({ "state": {} })).await?;
        let state: AccountState = decode(value)?;
        Ok(state.sequence)
    }

    async fn keys_by_username(
        &self,
        username: &Username,
    ) -> Result<BTreeMap<KeyHash, Key>, ChainClientError> {
        let factory = *self.factory()?;
        let msg = json!({ "keys_by_user": { "username": username } });
        decode(self.query_wasm_smart(&factory, msg).await?)
    }

    async fn accounts_by_username(&self, username: &Username) -> Result<Vec<Account>, ChainClientError> {
        let factory = *self.factory()?;
        let msg = json!({ "accounts_by_user": { "username": username } });
        let records: BTreeMap<Addr, AccountInfo> = decode(self.query_wasm_smart(&factory, msg).await?)?;

        let mut accounts: Vec<Account> = records
            .into_iter()
            .filter_map(|(address, info)| {
                let account_type = info.account_type()?;
                Some(Account {
                    address,
                    username: username.clone(),
                    index: info.index,
                    account_type,
                })
            })
            .collect();
        accounts.sort_by_key(|account| account.index);
        Ok(accounts)
    }

    async fn simulate(&self, tx: &UnsignedTx) -> Result<SimulateOutcome, ChainClientError> {
        let bytes = self.abci_query(SIMULATE_PATH, &encode(tx)?).await?;
        decode_bytes(&bytes)
    }

    async fn broadcast_tx_sync(&self, tx: &Tx) -> Result<BroadcastTxResponse, ChainClientError> {
        let params = json!({ "tx": STANDARD.encode(encode(tx)?) });
        let result = self.transport.request("broadcast_tx_sync", params).await?;
        decode(result)
    }
}
