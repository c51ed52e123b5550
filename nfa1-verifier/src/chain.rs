//! Read-only views of the ledger.
//!
//! The verifier only ever reads. `ChainReader` is the whole surface it
//! needs; `LogSource` is consumed by off-chain tooling that also looks at
//! emitted events.

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use nfa1_core::{CallOutcome, ChainError, EventLog, LogFilter, UnixSeconds};
use std::sync::Arc;

/// Code lookup and side-effect-free calls against the latest state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed bytecode at `address`; empty for accounts without code.
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError>;

    /// Execute `data` against `to` without committing any state.
    ///
    /// A revert is a normal outcome, not an error. `Err` is reserved for
    /// failures of the transport itself.
    async fn static_call(&self, to: Address, data: Bytes) -> Result<CallOutcome, ChainError>;

    /// Timestamp of the latest block.
    async fn latest_timestamp(&self) -> Result<UnixSeconds, ChainError>;
}

/// Historical event access.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<EventLog>, ChainError>;
}

#[async_trait]
impl<T: ChainReader + ?Sized> ChainReader for Arc<T> {
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        (**self).code_at(address).await
    }

    async fn static_call(&self, to: Address, data: Bytes) -> Result<CallOutcome, ChainError> {
        (**self).static_call(to, data).await
    }

    async fn latest_timestamp(&self) -> Result<UnixSeconds, ChainError> {
        (**self).latest_timestamp().await
    }
}

#[async_trait]
impl<T: LogSource + ?Sized> LogSource for Arc<T> {
    async fn block_number(&self) -> Result<u64, ChainError> {
        (**self).block_number().await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<EventLog>, ChainError> {
        (**self).logs(filter).await
    }
}
