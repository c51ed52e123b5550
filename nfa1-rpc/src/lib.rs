//! NFA-1 JSON-RPC transport
//!
//! Implements the verifier's `ChainReader` and `LogSource` over a node's
//! JSON-RPC 2.0 HTTP endpoint using `eth_getCode`, `eth_call`,
//! `eth_getBlockByNumber`, `eth_blockNumber` and `eth_getLogs`.
//!
//! Calls always target the `latest` block. Execution reverts are returned
//! as `CallOutcome::Revert`; HTTP timeouts surface as `ChainError::Timeout`
//! so the verifier can degrade the affected probe instead of aborting.

mod client;
mod quantity;
mod types;

pub use client::{RpcClient, DEFAULT_REQUEST_TIMEOUT};
pub use types::RpcErrorObject;
