//! NFA-1 Core - Data Types and ABI Primitives
//!
//! Pure data structures shared by the store, the verifier and the off-chain
//! tooling. No I/O lives here.

pub mod abi;
pub mod agent;
pub mod bindings;
pub mod call;
pub mod commitment;
pub mod config;
pub mod error;
pub mod events;
pub mod interfaces;
pub mod report;

pub use abi::{
    decode_revert_reason, encode_revert_reason, interface_id, selector, AbiReader,
    FunctionSignature, InterfaceId, ParamKind, WORD,
};
pub use agent::{
    AgentMetadata, AgentStatus, AgentStatusParseError, LearningState, RuntimeState, TokenId,
    UnixSeconds,
};
pub use call::CallOutcome;
pub use commitment::{
    compute_vault_digest, learning_leaf, learning_merkle_root, verify_learning_proof,
};
pub use config::VerifierConfig;
pub use error::{AbiError, AuditError, AuditResult, ChainError, ConfigError};
pub use events::{AgentEventKind, EventLog, LogFilter};
pub use interfaces::{ExtensionKind, InterfaceDef, NFA1_INTERFACE_VERSION};
pub use report::{
    AuditReport, Confidence, ExtensionFlags, ProbeOutcome, ProbeRecord, QuickCheck, Tier1Checks,
    Tier2Checks, Tier3Checks, Verdict,
};

// Chain primitives used across the workspace.
pub use alloy_primitives::{Address, Bytes, Selector, B256, U256};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Convert a block timestamp into a `Timestamp`, clamping out-of-range
/// values to the epoch.
pub fn timestamp_from_unix(seconds: UnixSeconds) -> Timestamp {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
