//! Audit report model.
//!
//! Every field is populated on every audit. When the target has no code the
//! sub-structures keep their `Default` (all false, zero counts).

use crate::interfaces::ExtensionKind;
use crate::Timestamp;
use alloy_primitives::{Address, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PROBE OUTCOMES
// ============================================================================

/// Result of one existence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeOutcome {
    #[default]
    NotAttempted,
    /// The target answered: success, or a revert carrying data
    ExistsConfirmed,
    /// Not called; declared by an interface the target self-certified
    ExistsInferred,
    /// Revert with no data: nothing matched the selector
    AbsentConfirmed,
    /// Could not be decided (timeout, unsafe arguments, malformed return)
    Inconclusive,
}

impl ProbeOutcome {
    /// Only positive evidence counts toward a check.
    pub fn is_detected(&self) -> bool {
        matches!(
            self,
            ProbeOutcome::ExistsConfirmed | ProbeOutcome::ExistsInferred
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::NotAttempted => "NOT_ATTEMPTED",
            ProbeOutcome::ExistsConfirmed => "EXISTS_CONFIRMED",
            ProbeOutcome::ExistsInferred => "EXISTS_INFERRED",
            ProbeOutcome::AbsentConfirmed => "ABSENT_CONFIRMED",
            ProbeOutcome::Inconclusive => "INCONCLUSIVE",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit trail entry for one probed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    /// Check this probe contributed to
    pub check: String,
    pub signature: String,
    pub selector: Selector,
    pub outcome: ProbeOutcome,
}

// ============================================================================
// VERDICT
// ============================================================================

/// Closed verdict vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "NOT_CONTRACT")]
    NotContract,
    #[serde(rename = "NOT_NFA1")]
    NotNfa1,
    #[serde(rename = "TIER1")]
    Tier1,
    #[serde(rename = "TIER2")]
    Tier2,
    #[serde(rename = "TIER3")]
    Tier3,
}

impl Verdict {
    /// Tiers are cumulative: a higher tier needs every lower threshold.
    pub fn from_tiers(tier1_met: bool, tier2_met: bool, tier3_met: bool) -> Self {
        match (tier1_met, tier2_met, tier3_met) {
            (true, true, true) => Verdict::Tier3,
            (true, true, false) => Verdict::Tier2,
            (true, false, _) => Verdict::Tier1,
            (false, _, _) => Verdict::NotNfa1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::NotContract => "NOT_CONTRACT",
            Verdict::NotNfa1 => "NOT_NFA1",
            Verdict::Tier1 => "TIER1",
            Verdict::Tier2 => "TIER2",
            Verdict::Tier3 => "TIER3",
        }
    }

    /// Numeric tier, 0 for the two negative verdicts.
    pub fn tier(&self) -> u8 {
        match self {
            Verdict::NotContract | Verdict::NotNfa1 => 0,
            Verdict::Tier1 => 1,
            Verdict::Tier2 => 2,
            Verdict::Tier3 => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TIER BATTERIES
// ============================================================================

fn count(flags: &[bool]) -> u8 {
    flags.iter().filter(|f| **f).count() as u8
}

/// Base surface: ownership, self-declaration, lifecycle, state and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tier1Checks {
    pub supports_erc721: bool,
    pub declares_nfa1: bool,
    pub has_lifecycle: bool,
    pub has_state_reader: bool,
    pub has_metadata_reader: bool,
    pub has_metadata_mutation: bool,
    pub passed: u8,
    pub total: u8,
}

impl Tier1Checks {
    pub const TOTAL: u8 = 6;
    pub const THRESHOLD: u8 = 5;

    /// Fill in `passed` and `total` from the boolean fields.
    pub fn tally(mut self) -> Self {
        self.passed = count(&[
            self.supports_erc721,
            self.declares_nfa1,
            self.has_lifecycle,
            self.has_state_reader,
            self.has_metadata_reader,
            self.has_metadata_mutation,
        ]);
        self.total = Self::TOTAL;
        self
    }

    pub fn met(&self) -> bool {
        self.total == Self::TOTAL && self.passed >= Self::THRESHOLD
    }
}

/// Learning-state readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tier2Checks {
    pub has_learning_state: bool,
    pub has_learning_root: bool,
    pub has_learning_enabled: bool,
    pub has_learning_version: bool,
    pub has_last_learning_update: bool,
    pub passed: u8,
    pub total: u8,
}

impl Tier2Checks {
    pub const TOTAL: u8 = 5;
    pub const THRESHOLD: u8 = 4;

    pub fn tally(mut self) -> Self {
        self.passed = count(&[
            self.has_learning_state,
            self.has_learning_root,
            self.has_learning_enabled,
            self.has_learning_version,
            self.has_last_learning_update,
        ]);
        self.total = Self::TOTAL;
        self
    }

    pub fn met(&self) -> bool {
        self.total == Self::TOTAL && self.passed >= Self::THRESHOLD
    }
}

/// Delegated action execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tier3Checks {
    pub has_execute_action: bool,
    pub has_logic_setter: bool,
    pub has_funding: bool,
    pub passed: u8,
    pub total: u8,
}

impl Tier3Checks {
    pub const TOTAL: u8 = 3;
    pub const THRESHOLD: u8 = 3;

    pub fn tally(mut self) -> Self {
        self.passed = count(&[self.has_execute_action, self.has_logic_setter, self.has_funding]);
        self.total = Self::TOTAL;
        self
    }

    pub fn met(&self) -> bool {
        self.total == Self::TOTAL && self.passed >= Self::THRESHOLD
    }
}

/// One flag per optional extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExtensionFlags {
    pub lineage: bool,
    pub payment: bool,
    pub identity: bool,
    pub receipts: bool,
    pub compliance: bool,
    pub learning_modules: bool,
    pub circuit_breaker: bool,
}

impl ExtensionFlags {
    pub fn get(&self, kind: ExtensionKind) -> bool {
        match kind {
            ExtensionKind::Lineage => self.lineage,
            ExtensionKind::Payment => self.payment,
            ExtensionKind::Identity => self.identity,
            ExtensionKind::Receipts => self.receipts,
            ExtensionKind::Compliance => self.compliance,
            ExtensionKind::LearningModules => self.learning_modules,
            ExtensionKind::CircuitBreaker => self.circuit_breaker,
        }
    }

    pub fn set(&mut self, kind: ExtensionKind, present: bool) {
        let slot = match kind {
            ExtensionKind::Lineage => &mut self.lineage,
            ExtensionKind::Payment => &mut self.payment,
            ExtensionKind::Identity => &mut self.identity,
            ExtensionKind::Receipts => &mut self.receipts,
            ExtensionKind::Compliance => &mut self.compliance,
            ExtensionKind::LearningModules => &mut self.learning_modules,
            ExtensionKind::CircuitBreaker => &mut self.circuit_breaker,
        };
        *slot = present;
    }

    pub fn any(&self) -> bool {
        ExtensionKind::ALL.iter().any(|k| self.get(*k))
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// Full structured compliance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub target: Address,
    pub audited_at: Timestamp,
    pub is_contract: bool,
    pub tier1: Tier1Checks,
    pub tier2: Tier2Checks,
    pub tier3: Tier3Checks,
    pub extensions: ExtensionFlags,
    pub verdict: Verdict,
    /// Every probe issued or inferred, in order
    pub probes: Vec<ProbeRecord>,
}

impl AuditReport {
    /// Short-circuit report for an address without code.
    pub fn not_contract(target: Address, audited_at: Timestamp) -> Self {
        Self {
            target,
            audited_at,
            is_contract: false,
            tier1: Tier1Checks::default(),
            tier2: Tier2Checks::default(),
            tier3: Tier3Checks::default(),
            extensions: ExtensionFlags::default(),
            verdict: Verdict::NotContract,
            probes: Vec::new(),
        }
    }
}

/// How many independent signals agree that a target is an agent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Map an agreeing-signal count (out of three) to a label.
    pub fn from_signals(agreeing: u8) -> Self {
        match agreeing {
            0 => Confidence::None,
            1 => Confidence::Low,
            2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::None => "NONE",
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the single-signal convenience check.
///
/// Lower confidence than `AuditReport`: it trusts self-declaration for
/// tier 1 and samples one function per higher tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCheck {
    pub is_likely_compliant: bool,
    pub tier: u8,
    /// Always `Low`
    pub confidence: Confidence,
}

impl QuickCheck {
    pub const NEGATIVE: QuickCheck = QuickCheck {
        is_likely_compliant: false,
        tier: 0,
        confidence: Confidence::Low,
    };

    /// Positive result at `tier`.
    pub fn likely(tier: u8) -> Self {
        Self {
            is_likely_compliant: true,
            tier,
            confidence: Confidence::Low,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
