//! Per-token agent data model.
//!
//! These are the shapes a conformant store keeps for every token. The
//! verifier never reads them directly; it only checks that their ABI-visible
//! projections look plausible.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque ERC-721 token identifier.
pub type TokenId = U256;

/// Block timestamp in seconds since the Unix epoch.
pub type UnixSeconds = u64;

// ============================================================================
// LIFECYCLE STATUS
// ============================================================================

/// Lifecycle status of an agent. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum AgentStatus {
    /// Accepts delegated actions
    #[default]
    Active = 0,
    /// Temporarily frozen by its owner
    Paused = 1,
    /// Permanently retired; no way back
    Terminated = 2,
}

impl AgentStatus {
    /// ABI representation (`uint8`).
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AgentStatus::Active),
            1 => Some(AgentStatus::Paused),
            2 => Some(AgentStatus::Terminated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "Active",
            AgentStatus::Paused => "Paused",
            AgentStatus::Terminated => "Terminated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Terminated)
    }

    /// Lifecycle state machine: Active <-> Paused, either -> Terminated.
    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (AgentStatus::Active, AgentStatus::Paused)
                | (AgentStatus::Paused, AgentStatus::Active)
                | (AgentStatus::Active, AgentStatus::Terminated)
                | (AgentStatus::Paused, AgentStatus::Terminated)
        )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = AgentStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AgentStatus::Active),
            "paused" => Ok(AgentStatus::Paused),
            "terminated" => Ok(AgentStatus::Terminated),
            _ => Err(AgentStatusParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid agent status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatusParseError(pub String);

impl fmt::Display for AgentStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent status: {}", self.0)
    }
}

impl std::error::Error for AgentStatusParseError {}

// ============================================================================
// PER-TOKEN STATE
// ============================================================================

/// Runtime state of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    /// Native-currency credit held in custody by the store
    pub balance: U256,
    pub status: AgentStatus,
    /// Always equal to the token's current holder
    pub owner: Address,
    /// Contract that executes delegated actions; `None` disables execution
    pub delegated_logic: Option<Address>,
    /// Time of the most recent delegated action, never decreasing
    pub last_action_time: UnixSeconds,
}

impl RuntimeState {
    pub fn new(owner: Address, delegated_logic: Option<Address>) -> Self {
        Self {
            balance: U256::ZERO,
            status: AgentStatus::Active,
            owner,
            delegated_logic,
            last_action_time: 0,
        }
    }
}

/// Descriptive metadata of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentMetadata {
    pub persona: String,
    pub experience: String,
    pub voice_ref: Option<String>,
    pub animation_ref: Option<String>,
    /// URI of the externally hosted vault
    pub vault_location: String,
    /// Integrity commitment to the vault contents, not the contents
    pub vault_digest: B256,
}

/// Learning commitment of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningState {
    /// Merkle root over off-chain learning records (see `commitment`)
    pub learning_digest: B256,
    /// Strictly increasing across accepted updates
    pub version: u64,
    pub last_update_time: UnixSeconds,
    pub enabled: bool,
}

impl LearningState {
    pub fn new(enabled: bool) -> Self {
        Self {
            learning_digest: B256::ZERO,
            version: 0,
            last_update_time: 0,
            enabled,
        }
    }

    /// Whether an update proposing `new_version` may be accepted.
    pub fn accepts_version(&self, new_version: u64) -> bool {
        new_version > self.version
    }
}

// =============================================================================
// TESTS
// =============================================================================
