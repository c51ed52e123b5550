//! Raw outcome of a read-only call.

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

/// What the target did with a `staticcall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    /// Returned normally with this data
    Success(Bytes),
    /// Reverted; the data may be empty
    Revert(Bytes),
}

impl CallOutcome {
    pub fn success(data: impl Into<Bytes>) -> Self {
        CallOutcome::Success(data.into())
    }

    pub fn revert(data: impl Into<Bytes>) -> Self {
        CallOutcome::Revert(data.into())
    }

    /// Revert without any data, the signature of an unmatched selector or a
    /// write attempted in a static context.
    pub fn empty_revert() -> Self {
        CallOutcome::Revert(Bytes::new())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    pub fn data(&self) -> &Bytes {
        match self {
            CallOutcome::Success(data) | CallOutcome::Revert(data) => data,
        }
    }
}
