//! Probe classification.
//!
//! Everything here is pure: given what a call returned (or whether the
//! target self-declared an interface), decide a `ProbeOutcome`. The async
//! plumbing that issues the calls lives in `verifier`.

use nfa1_core::{AbiReader, CallOutcome, FunctionSignature, ProbeOutcome, WORD};

/// Why a function may not be safe to call directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeHazard {
    None,
    /// Writes state even on a logically read-only path (reentrancy lock,
    /// payable credit), so a static call reverts without data.
    MutatingGuard,
    /// Variable-length or tuple parameters; placeholder words are not a
    /// valid encoding.
    DynamicArgs,
}

impl ProbeHazard {
    /// Hazard of `signature`. Dynamic parameters dominate a mutating guard.
    pub fn of(signature: &FunctionSignature, guarded: bool) -> Self {
        if signature.has_dynamic_params() {
            ProbeHazard::DynamicArgs
        } else if guarded {
            ProbeHazard::MutatingGuard
        } else {
            ProbeHazard::None
        }
    }
}

/// Plausibility check applied to successful return data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    Any,
    /// `(uint256, uint8 status, address, address, uint256)`
    RuntimeState,
    /// ABI-encoded dynamic tuple: head offset `0x20`, word aligned
    Metadata,
    /// `(bytes32, uint256, uint256, bool)`
    LearningState,
}

impl ReturnShape {
    pub fn accepts(&self, data: &[u8]) -> bool {
        let reader = AbiReader::new(data);
        match self {
            ReturnShape::Any => true,
            ReturnShape::RuntimeState => {
                reader.word_count() >= 5
                    && reader.u8(1).map(|status| status <= 2).unwrap_or(false)
                    && reader.address(2).is_ok()
                    && reader.address(3).is_ok()
            }
            ReturnShape::Metadata => {
                !reader.is_empty()
                    && reader.is_word_aligned()
                    && reader.u64(0).map(|offset| offset == WORD as u64).unwrap_or(false)
            }
            ReturnShape::LearningState => reader.word_count() >= 4 && reader.bool(3).is_ok(),
        }
    }
}

/// What to do for one battery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePlan {
    /// Issue a raw selector probe.
    Call,
    /// Do not call; settle on this outcome.
    Settle(ProbeOutcome),
}

/// Decide how to probe a function with `hazard`, given whether one of the
/// interfaces declaring it was self-certified by the target.
pub fn plan(hazard: ProbeHazard, declared: bool) -> ProbePlan {
    match (hazard, declared) {
        (ProbeHazard::None, _) => ProbePlan::Call,
        (_, true) => ProbePlan::Settle(ProbeOutcome::ExistsInferred),
        (ProbeHazard::DynamicArgs, false) => ProbePlan::Settle(ProbeOutcome::Inconclusive),
        (ProbeHazard::MutatingGuard, false) => ProbePlan::Call,
    }
}

/// Classify the answer to a raw selector probe.
pub fn classify(outcome: &CallOutcome, shape: ReturnShape) -> ProbeOutcome {
    match outcome {
        CallOutcome::Success(data) if shape.accepts(data) => ProbeOutcome::ExistsConfirmed,
        CallOutcome::Success(_) => ProbeOutcome::Inconclusive,
        CallOutcome::Revert(data) if !data.is_empty() => ProbeOutcome::ExistsConfirmed,
        CallOutcome::Revert(_) => ProbeOutcome::AbsentConfirmed,
    }
}

/// True only for a successful interface query whose first word is exactly 1.
pub fn is_declared(outcome: &CallOutcome) -> bool {
    match outcome {
        CallOutcome::Success(data) => AbiReader::new(data)
            .bool(0)
            .unwrap_or(false),
        CallOutcome::Revert(_) => false,
    }
}
