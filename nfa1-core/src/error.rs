//! Error types for NFA-1 auditing

use thiserror::Error;

/// Failures of the read-only ledger transport.
///
/// Only `Timeout` is recoverable inside an audit: the affected probe becomes
/// inconclusive. Every other variant aborts the whole invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Call timed out after {elapsed_ms}ms: {method}")]
    Timeout { method: String, elapsed_ms: u64 },

    #[error("Transport failure talking to {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response for {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

impl ChainError {
    /// Whether this failure should only degrade a single probe.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChainError::Timeout { .. })
    }
}

/// ABI encoding and decoding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("Invalid function signature {signature:?}: {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("Data too short: need {needed} bytes, got {got}")]
    ShortData { needed: usize, got: usize },

    #[error("Word {index} is not a valid {kind}")]
    InvalidWord { index: usize, kind: &'static str },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for audit invocations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

// =============================================================================
// TESTS
// =============================================================================
