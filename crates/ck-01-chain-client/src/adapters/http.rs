//! # HTTP Transport
//!
//! JSON-RPC 2.0 over HTTP POST.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::TransportConfig;
use crate::domain::errors::TransportError;
use crate::ports::outbound::RpcTransport;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// `RpcTransport` backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
    url: String,
    request_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id();
        debug!(method, id, url = %self.url, "JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&JsonRpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TransportError::Connection(format!("Cannot connect to {}", self.url))
                } else {
                    TransportError::Http(e.to_string())
                }
            })?;

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        if let Some(error) = body.error {
            let message = match error.data {
                Some(Value::String(data)) => format!("{} ({data})", error.message),
                _ => error.message,
            };
            return Err(TransportError::Rpc {
                code: error.code,
                message,
            });
        }

        body.result
            .ok_or_else(|| TransportError::Parse("Missing result in response".to_string()))
    }
}
