//! JSON-RPC client implementing the verifier's ledger traits.

use crate::quantity::{format_quantity, parse_hex_bytes, parse_hex_u64};
use crate::types::{
    BlockHeader, CallRequest, JsonRpcRequest, JsonRpcResponse, LogQuery, RpcErrorObject, RpcLog,
};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use nfa1_core::{CallOutcome, ChainError, EventLog, LogFilter, UnixSeconds};
use nfa1_verifier::{ChainReader, LogSource};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static RPC_ID: AtomicU64 = AtomicU64::new(1);

/// Default HTTP timeout for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only JSON-RPC client for an Ethereum-compatible node.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl RpcClient {
    /// Client with the default request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, ChainError> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client whose every request gives up after `timeout`.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport {
                endpoint: redact_endpoint(&url),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Endpoint with credentials, path and query stripped, safe for logs.
    pub fn endpoint(&self) -> String {
        redact_endpoint(&self.url)
    }

    /// Send one request and return the raw envelope.
    async fn send<P, R>(&self, method: &str, params: P) -> Result<JsonRpcResponse<R>, ChainError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = RPC_ID.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        tracing::debug!(method, id, "Sending JSON-RPC request");

        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(method, started, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(method, id, status = status.as_u16(), "JSON-RPC HTTP failure");
            return Err(ChainError::Transport {
                endpoint: self.endpoint(),
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(method, started, e))?;
        serde_json::from_str(&body).map_err(|e| ChainError::InvalidResponse {
            method: method.to_string(),
            reason: format!("Malformed JSON-RPC envelope: {}", e),
        })
    }

    /// Send one request, treating a JSON-RPC error member as a failure.
    async fn request<P, R>(&self, method: &str, params: P) -> Result<R, ChainError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let envelope = self.send(method, params).await?;
        if let Some(err) = envelope.error {
            tracing::warn!(method, code = err.code, message = %err.message, "JSON-RPC error");
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope.result.ok_or_else(|| missing_result(method))
    }

    fn transport_error(&self, method: &str, started: Instant, err: reqwest::Error) -> ChainError {
        if err.is_timeout() {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::warn!(method, elapsed_ms, "JSON-RPC request timed out");
            return ChainError::Timeout {
                method: method.to_string(),
                elapsed_ms,
            };
        }
        tracing::warn!(method, error = %err, "JSON-RPC transport failure");
        ChainError::Transport {
            endpoint: self.endpoint(),
            reason: err.to_string(),
        }
    }

    /// `eth_blockNumber`.
    pub async fn get_block_number(&self) -> Result<u64, ChainError> {
        let no_params: [u8; 0] = [];
        let head: String = self.request("eth_blockNumber", no_params).await?;
        parse_hex_u64("eth_blockNumber", &head)
    }

    /// `eth_getCode` at the latest block.
    pub async fn get_code(&self, address: Address) -> Result<Bytes, ChainError> {
        self.request("eth_getCode", (address, "latest")).await
    }

    /// `eth_call` at the latest block.
    ///
    /// Execution failures come back as JSON-RPC errors. They are an answer,
    /// not a failure: revert data attached to the error becomes
    /// `CallOutcome::Revert(data)` and anything else the EVM reports (a bare
    /// revert, an invalid opcode, running out of gas) becomes an empty
    /// revert. Only errors that reject the request itself surface as `Err`.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<CallOutcome, ChainError> {
        const METHOD: &str = "eth_call";
        let envelope: JsonRpcResponse<Bytes> = self
            .send(METHOD, (CallRequest { to, data }, "latest"))
            .await?;

        match envelope.error {
            Some(err) => revert_outcome(METHOD, err),
            None => envelope
                .result
                .map(CallOutcome::Success)
                .ok_or_else(|| missing_result(METHOD)),
        }
    }

    /// Timestamp of the latest block.
    pub async fn get_latest_timestamp(&self) -> Result<UnixSeconds, ChainError> {
        const METHOD: &str = "eth_getBlockByNumber";
        let header: Option<BlockHeader> = self.request(METHOD, ("latest", false)).await?;
        let header = header.ok_or_else(|| missing_result(METHOD))?;
        parse_hex_u64(METHOD, &header.timestamp)
    }

    /// `eth_getLogs` for one address over an inclusive block range.
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EventLog>, ChainError> {
        const METHOD: &str = "eth_getLogs";
        let query = LogQuery {
            address: filter.address,
            from_block: format_quantity(filter.from_block),
            to_block: format_quantity(filter.to_block),
        };
        let logs: Vec<RpcLog> = self.request(METHOD, [query]).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(block) = log.block_number else {
                continue;
            };
            events.push(EventLog {
                address: log.address,
                block_number: parse_hex_u64(METHOD, &block)?,
                topics: log.topics,
                data: log.data,
            });
        }
        tracing::debug!(count = events.len(), "Fetched logs");
        Ok(events)
    }
}

fn revert_outcome(method: &str, err: RpcErrorObject) -> Result<CallOutcome, ChainError> {
    if err.is_request_rejection() {
        tracing::warn!(method, code = err.code, message = %err.message, "JSON-RPC error");
        return Err(ChainError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    if let Some(data) = err.revert_data() {
        return Ok(CallOutcome::revert(parse_hex_bytes(method, data)?));
    }
    tracing::debug!(method, code = err.code, message = %err.message, "Execution failed without data");
    Ok(CallOutcome::empty_revert())
}

fn missing_result(method: &str) -> ChainError {
    ChainError::InvalidResponse {
        method: method.to_string(),
        reason: "Response carries neither result nor error".to_string(),
    }
}

fn redact_endpoint(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            },
            None => parsed.scheme().to_string(),
        },
        Err(_) => "[invalid url]".to_string(),
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        self.get_code(address).await
    }

    async fn static_call(&self, to: Address, data: Bytes) -> Result<CallOutcome, ChainError> {
        self.call(to, data).await
    }

    async fn latest_timestamp(&self) -> Result<UnixSeconds, ChainError> {
        self.get_latest_timestamp().await
    }
}

#[async_trait]
impl LogSource for RpcClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.get_block_number().await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<EventLog>, ChainError> {
        self.get_logs(filter).await
    }
}
