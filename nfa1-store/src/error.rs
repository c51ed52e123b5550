//! Store guard failures.

use nfa1_core::{encode_revert_reason, AgentStatus, TokenId};
use alloy_primitives::{Address, Bytes, U256};
use thiserror::Error;

/// Every guard clause of the reference store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("nonexistent token {token_id}")]
    NonexistentToken { token_id: TokenId },

    #[error("caller {caller} not authorized to {action}")]
    NotAuthorized { caller: Address, action: &'static str },

    #[error("caller {caller} is not the admin")]
    NotAdmin { caller: Address },

    #[error("agent {token_id} is terminated")]
    AgentTerminated { token_id: TokenId },

    #[error("agent {token_id} is {status}, not Active")]
    AgentNotActive { token_id: TokenId, status: AgentStatus },

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: AgentStatus, to: AgentStatus },

    #[error("agent {token_id} has no delegated logic")]
    NoDelegatedLogic { token_id: TokenId },

    #[error("learning disabled for agent {token_id}")]
    LearningDisabled { token_id: TokenId },

    #[error("learning version {proposed} out of range")]
    VersionOutOfRange { proposed: U256 },

    #[error("learning version {proposed} must exceed {current}")]
    StaleLearningVersion { current: u64, proposed: u64 },

    #[error("reentrant call")]
    Reentrancy,

    #[error("{field} is the zero address")]
    ZeroAddress { field: &'static str },

    #[error("token {token_id} is not owned by {claimed}")]
    WrongOwner { token_id: TokenId, claimed: Address },
}

impl StoreError {
    /// Standard `Error(string)` revert payload for this failure.
    pub fn revert_data(&self) -> Bytes {
        encode_revert_reason(&format!("NFA: {}", self))
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
