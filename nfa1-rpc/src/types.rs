//! JSON-RPC 2.0 envelope and the Ethereum payloads the transport reads.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse<R> {
    pub result: Option<R>,
    pub error: Option<RpcErrorObject>,
}

/// Error member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RpcErrorObject {
    /// Revert payload attached by the node, if any.
    ///
    /// Nodes disagree on where they put it: most use a hex string, some wrap
    /// it in an object with a `data` member.
    pub fn revert_data(&self) -> Option<&str> {
        match self.data.as_ref()? {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map.get("data")?.as_str(),
            _ => None,
        }
    }

    /// Whether the node refused the request itself: a parse failure or one of
    /// the reserved request errors (-32600 to -32603).
    ///
    /// Every other error on a call means execution ran and failed. Nodes
    /// disagree on the code for that (3, -32000, -32015) and on the wording
    /// ("execution reverted", "invalid opcode", "out of gas").
    pub fn is_request_rejection(&self) -> bool {
        self.code == -32700 || (-32603..=-32600).contains(&self.code)
    }
}

/// `eth_call` transaction object. Only the fields a read needs.
#[derive(Debug, Serialize)]
pub(crate) struct CallRequest {
    pub to: Address,
    pub data: Bytes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogQuery {
    pub address: Address,
    pub from_block: String,
    pub to_block: String,
}

/// Block header fields read by the transport.
#[derive(Debug, Deserialize)]
pub(crate) struct BlockHeader {
    pub timestamp: String,
}

/// Log entry as returned by `eth_getLogs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    /// Null for pending logs.
    pub block_number: Option<String>,
}
