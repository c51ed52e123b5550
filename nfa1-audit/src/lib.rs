//! NFA-1 Off-chain Audit
//!
//! Runs the verifier against a live ledger and cross-references the
//! target's recent event logs, a signal the on-chain verifier cannot see.
//! The result is a JSON document: the full report, the quick check, the
//! event activity, a qualitative confidence label and the structural
//! limitations of address-only auditing.

pub mod activity;
pub mod auditor;
pub mod config;

pub use activity::EventActivity;
pub use auditor::{confidence, limitations, OffchainAuditor, OffchainReport, QuickReport};
pub use config::{AuditConfig, ConfigError};
