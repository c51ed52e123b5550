//! Event signatures and raw log records.

use alloy_primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events a conformant store emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentEventKind {
    AgentCreated,
    ActionExecuted,
    LogicUpdated,
    AgentFunded,
    StatusChanged,
    MetadataUpdated,
    LearningUpdated,
    /// ERC-721 ownership transfer
    Transfer,
}

impl AgentEventKind {
    pub const ALL: [AgentEventKind; 8] = [
        AgentEventKind::AgentCreated,
        AgentEventKind::ActionExecuted,
        AgentEventKind::LogicUpdated,
        AgentEventKind::AgentFunded,
        AgentEventKind::StatusChanged,
        AgentEventKind::MetadataUpdated,
        AgentEventKind::LearningUpdated,
        AgentEventKind::Transfer,
    ];

    /// Canonical event signature.
    pub fn signature(&self) -> &'static str {
        match self {
            AgentEventKind::AgentCreated => "AgentCreated(uint256,address,address)",
            AgentEventKind::ActionExecuted => "ActionExecuted(uint256,address,bytes32)",
            AgentEventKind::LogicUpdated => "LogicUpdated(uint256,address,address)",
            AgentEventKind::AgentFunded => "AgentFunded(uint256,address,uint256)",
            AgentEventKind::StatusChanged => "StatusChanged(uint256,uint8)",
            AgentEventKind::MetadataUpdated => "MetadataUpdated(uint256)",
            AgentEventKind::LearningUpdated => "LearningUpdated(uint256,bytes32,bytes32,uint256)",
            AgentEventKind::Transfer => "Transfer(address,address,uint256)",
        }
    }

    /// First log topic: keccak-256 of the signature.
    pub fn topic0(&self) -> B256 {
        keccak256(self.signature().as_bytes())
    }

    pub fn from_topic0(topic: &B256) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.topic0() == *topic)
    }

    /// False for events any ERC-721 contract emits.
    pub fn is_agent_specific(&self) -> bool {
        !matches!(self, AgentEventKind::Transfer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentEventKind::AgentCreated => "AgentCreated",
            AgentEventKind::ActionExecuted => "ActionExecuted",
            AgentEventKind::LogicUpdated => "LogicUpdated",
            AgentEventKind::AgentFunded => "AgentFunded",
            AgentEventKind::StatusChanged => "StatusChanged",
            AgentEventKind::MetadataUpdated => "MetadataUpdated",
            AgentEventKind::LearningUpdated => "LearningUpdated",
            AgentEventKind::Transfer => "Transfer",
        }
    }
}

impl fmt::Display for AgentEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw log record as returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub address: Address,
    pub block_number: u64,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl EventLog {
    /// Recognized event kind, from the first topic.
    pub fn kind(&self) -> Option<AgentEventKind> {
        self.topics.first().and_then(AgentEventKind::from_topic0)
    }
}

/// Inclusive block range query for one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub address: Address,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogFilter {
    /// The last `window` blocks up to and including `head`.
    pub fn recent(address: Address, head: u64, window: u64) -> Self {
        Self {
            address,
            from_block: head.saturating_sub(window.saturating_sub(1)),
            to_block: head,
        }
    }

    pub fn contains(&self, block: u64) -> bool {
        (self.from_block..=self.to_block).contains(&block)
    }
}
