//! The off-chain audit: the verifier's report cross-referenced with recent
//! event activity.

use crate::activity::EventActivity;
use alloy_primitives::Address;
use nfa1_core::{
    AuditReport, AuditResult, ChainError, Confidence, LogFilter, QuickCheck, Verdict,
    VerifierConfig,
};
use nfa1_verifier::{ChainReader, LogSource, Verifier, LIMITATIONS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Limitation specific to the event scan.
pub const EVENT_SCAN_LIMITATION: &str =
    "Event activity covers only the scanned block window and never changes the verdict; it only raises confidence.";

/// JSON document produced by the audit tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainReport {
    pub report: AuditReport,
    pub quick: QuickCheck,
    pub events: EventActivity,
    pub confidence: Confidence,
    pub limitations: Vec<String>,
}

/// Output of `--quick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReport {
    pub target: Address,
    pub quick: QuickCheck,
}

pub fn limitations() -> Vec<String> {
    LIMITATIONS
        .iter()
        .copied()
        .chain(std::iter::once(EVENT_SCAN_LIMITATION))
        .map(str::to_string)
        .collect()
}

/// Count the independent signals that agree the target is an NFA-1 store:
/// self-declaration, a verdict of at least `TIER1`, and agent-specific event
/// activity in the window.
///
/// An unavailable scan never agrees, so the label is at most `MEDIUM`.
pub fn confidence(report: &AuditReport, events: &EventActivity) -> Confidence {
    if !report.is_contract {
        return Confidence::None;
    }
    let signals = [
        report.tier1.declares_nfa1,
        report.verdict >= Verdict::Tier1,
        !events.unavailable && events.has_agent_activity(),
    ];
    Confidence::from_signals(signals.iter().filter(|s| **s).count() as u8)
}

/// Runs the verifier plus the event-window scan against one ledger.
#[derive(Debug, Clone)]
pub struct OffchainAuditor<C> {
    verifier: Verifier<C>,
    log_window_blocks: u64,
}

impl<C: ChainReader + LogSource> OffchainAuditor<C> {
    pub fn new(chain: C, config: VerifierConfig, log_window_blocks: u64) -> AuditResult<Self> {
        Ok(Self {
            verifier: Verifier::with_config(chain, config)?,
            log_window_blocks,
        })
    }

    pub fn verifier(&self) -> &Verifier<C> {
        &self.verifier
    }

    /// Full audit, quick check and event scan.
    ///
    /// An address without code skips the quick check and the scan and is
    /// reported with confidence `NONE`.
    pub async fn run(&self, target: Address) -> AuditResult<OffchainReport> {
        let report = self.verifier.full_audit(target).await?;
        if !report.is_contract {
            info!(%target, "Target has no code");
            return Ok(OffchainReport {
                report,
                quick: QuickCheck::NEGATIVE,
                events: EventActivity::default(),
                confidence: Confidence::None,
                limitations: limitations(),
            });
        }

        let quick = self.verifier.quick_check(target).await?;
        let events = self.scan_events(target).await?;
        let confidence = confidence(&report, &events);
        info!(
            %target,
            verdict = %report.verdict,
            %confidence,
            events = events.total,
            "Off-chain audit complete"
        );

        Ok(OffchainReport {
            report,
            quick,
            events,
            confidence,
            limitations: limitations(),
        })
    }

    pub async fn quick(&self, target: Address) -> AuditResult<QuickReport> {
        let quick = self.verifier.quick_check(target).await?;
        Ok(QuickReport { target, quick })
    }

    /// Tally the target's logs over the last `log_window_blocks` blocks.
    ///
    /// A node that refuses the scan (range limits, pruned history) yields
    /// `EventActivity::unavailable` over whatever window was known. Timeouts
    /// still fail the audit.
    pub async fn scan_events(&self, target: Address) -> AuditResult<EventActivity> {
        let chain = self.verifier.chain();
        let head = match chain.block_number().await {
            Ok(head) => head,
            Err(err) => return scan_failure(target, err, EventActivity::unavailable(0, 0)),
        };
        let filter = LogFilter::recent(target, head, self.log_window_blocks);
        let logs = match chain.logs(&filter).await {
            Ok(logs) => logs,
            Err(err) => {
                let window = EventActivity::unavailable(filter.from_block, filter.to_block);
                return scan_failure(target, err, window);
            }
        };
        debug!(
            %target,
            from_block = filter.from_block,
            to_block = filter.to_block,
            count = logs.len(),
            "Scanned event window"
        );
        Ok(EventActivity::tally(&filter, &logs))
    }
}

fn scan_failure(target: Address, err: ChainError, window: EventActivity) -> AuditResult<EventActivity> {
    if err.is_timeout() {
        return Err(err.into());
    }
    warn!(
        %target,
        from_block = window.from_block,
        to_block = window.to_block,
        error = %err,
        "Event scan unavailable"
    );
    Ok(window)
}
