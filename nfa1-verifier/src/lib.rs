//! NFA-1 Verifier - Read-only Compliance Auditing
//!
//! Classifies an arbitrary address into a compliance tier using only its
//! externally observable call behavior:
//!
//! - **Interface probe**: ERC-165 `supportsInterface`, the target's own
//!   self-declaration. Also the fallback for functions that cannot be safely
//!   called directly.
//! - **Selector probe**: a static call with placeholder arguments. Success or
//!   a revert carrying data means the function exists; a bare revert means
//!   nothing matched the selector.
//!
//! Address-only auditing has permanent structural limits. It cannot verify
//! event emission, cannot verify that a lifecycle transition is truly
//! irreversible, and cannot verify field names beyond ABI-visible shape.
//! See [`LIMITATIONS`].

pub mod battery;
pub mod chain;
pub mod probe;
pub mod verifier;

pub use battery::ProbeSpec;
pub use chain::{ChainReader, LogSource};
pub use probe::{classify, is_declared, plan, ProbeHazard, ProbePlan, ReturnShape};
pub use verifier::{interface_query, Verifier};

/// Structural limitations of address-only auditing.
pub const LIMITATIONS: &[&str] = &[
    "Event emission cannot be verified by calling the target; only declared function surfaces are probed.",
    "Internal code-path guarantees such as the irreversibility of termination cannot be verified, only that the lifecycle functions exist and respond plausibly.",
    "Struct field naming cannot be verified; only the ABI-visible shape of return data is checked.",
    "Functions behind a state-writing guard or with dynamic arguments are credited from interface self-declaration, not called.",
];
