//! Fixed check batteries.

use crate::probe::{ProbeHazard, ReturnShape};
use nfa1_core::interfaces::{self, ExtensionKind};
use nfa1_core::{AbiError, FunctionSignature};

/// One function probed on behalf of a named check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSpec {
    pub check: &'static str,
    pub signature: &'static str,
    /// Known to take a state-writing guard on every path
    pub guarded: bool,
    pub shape: ReturnShape,
    /// Declared by the NFA-1 interface, so self-declaration can stand in
    /// for a direct call
    pub in_nfa1: bool,
}

impl ProbeSpec {
    const fn nfa1(check: &'static str, signature: &'static str) -> Self {
        Self {
            check,
            signature,
            guarded: false,
            shape: ReturnShape::Any,
            in_nfa1: true,
        }
    }

    const fn shaped(mut self, shape: ReturnShape) -> Self {
        self.shape = shape;
        self
    }

    const fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    pub fn parse(&self) -> Result<FunctionSignature, AbiError> {
        FunctionSignature::parse(self.signature)
    }

    pub fn hazard(&self) -> Result<ProbeHazard, AbiError> {
        Ok(ProbeHazard::of(&self.parse()?, self.guarded))
    }
}

// ============================================================================
// TIER 1
// ============================================================================

pub const CHECK_SUPPORTS_ERC721: &str = "supports_erc721";
pub const CHECK_DECLARES_NFA1: &str = "declares_nfa1";
pub const CHECK_LIFECYCLE: &str = "has_lifecycle";
pub const CHECK_STATE_READER: &str = "has_state_reader";
pub const CHECK_METADATA_READER: &str = "has_metadata_reader";
pub const CHECK_METADATA_MUTATION: &str = "has_metadata_mutation";

/// Function probes of the tier-1 battery. The two interface checks are
/// issued separately as ERC-165 queries.
pub static TIER1_PROBES: &[ProbeSpec] = &[
    ProbeSpec::nfa1(CHECK_LIFECYCLE, interfaces::PAUSE),
    ProbeSpec::nfa1(CHECK_LIFECYCLE, interfaces::UNPAUSE),
    ProbeSpec::nfa1(CHECK_LIFECYCLE, interfaces::TERMINATE),
    ProbeSpec::nfa1(CHECK_STATE_READER, interfaces::GET_STATE).shaped(ReturnShape::RuntimeState),
    ProbeSpec::nfa1(CHECK_METADATA_READER, interfaces::GET_AGENT_METADATA)
        .shaped(ReturnShape::Metadata),
    // Static arguments, so a raw call settles the check.
    ProbeSpec::nfa1(CHECK_METADATA_MUTATION, interfaces::UPDATE_LEARNING),
];

// ============================================================================
// TIER 2
// ============================================================================

pub const CHECK_LEARNING_STATE: &str = "has_learning_state";
pub const CHECK_LEARNING_ROOT: &str = "has_learning_root";
pub const CHECK_LEARNING_ENABLED: &str = "has_learning_enabled";
pub const CHECK_LEARNING_VERSION: &str = "has_learning_version";
pub const CHECK_LAST_LEARNING_UPDATE: &str = "has_last_learning_update";

pub static TIER2_PROBES: &[ProbeSpec] = &[
    ProbeSpec::nfa1(CHECK_LEARNING_STATE, interfaces::GET_LEARNING_STATE)
        .shaped(ReturnShape::LearningState),
    ProbeSpec::nfa1(CHECK_LEARNING_ROOT, interfaces::GET_LEARNING_ROOT),
    ProbeSpec::nfa1(CHECK_LEARNING_ENABLED, interfaces::IS_LEARNING_ENABLED),
    ProbeSpec::nfa1(CHECK_LEARNING_VERSION, interfaces::GET_LEARNING_VERSION),
    ProbeSpec::nfa1(CHECK_LAST_LEARNING_UPDATE, interfaces::GET_LAST_LEARNING_UPDATE),
];

// ============================================================================
// TIER 3
// ============================================================================

pub const CHECK_EXECUTE_ACTION: &str = "has_execute_action";
pub const CHECK_LOGIC_SETTER: &str = "has_logic_setter";
pub const CHECK_FUNDING: &str = "has_funding";

pub static TIER3_PROBES: &[ProbeSpec] = &[
    ProbeSpec::nfa1(CHECK_EXECUTE_ACTION, interfaces::EXECUTE_ACTION).guarded(),
    ProbeSpec::nfa1(CHECK_LOGIC_SETTER, interfaces::SET_LOGIC_ADDRESS),
    ProbeSpec::nfa1(CHECK_FUNDING, interfaces::FUND_AGENT).guarded(),
];

// ============================================================================
// EXTENSIONS
// ============================================================================

/// Raw probes for one extension: every representative function of its
/// interface, never inferred.
pub fn extension_probes(kind: ExtensionKind) -> impl Iterator<Item = ProbeSpec> {
    kind.interface()
        .signatures
        .iter()
        .copied()
        .map(move |signature| ProbeSpec {
            check: kind.as_str(),
            signature,
            guarded: false,
            shape: ReturnShape::Any,
            in_nfa1: false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfa1_core::interfaces::NFA1;
    use nfa1_core::{Tier1Checks, Tier2Checks, Tier3Checks};
    use std::collections::BTreeSet;

    fn checks(battery: &[ProbeSpec]) -> BTreeSet<&'static str> {
        battery.iter().map(|p| p.check).collect()
    }

    #[test]
    fn test_battery_sizes_match_denominators() {
        // Two tier-1 checks are interface queries.
        assert_eq!(checks(TIER1_PROBES).len() + 2, Tier1Checks::TOTAL as usize);
        assert_eq!(checks(TIER2_PROBES).len(), Tier2Checks::TOTAL as usize);
        assert_eq!(checks(TIER3_PROBES).len(), Tier3Checks::TOTAL as usize);
    }

    #[test]
    fn test_every_probe_is_declared_by_nfa1() {
        for spec in TIER1_PROBES.iter().chain(TIER2_PROBES).chain(TIER3_PROBES) {
            assert!(spec.in_nfa1);
            assert!(NFA1.declares(spec.signature), "{}", spec.signature);
            assert!(spec.parse().is_ok());
        }
    }

    #[test]
    fn test_hazards() {
        let hazard = |sig: &str| {
            TIER1_PROBES
                .iter()
                .chain(TIER3_PROBES)
                .find(|p| p.signature == sig)
                .unwrap()
                .hazard()
                .unwrap()
        };
        assert_eq!(hazard(interfaces::EXECUTE_ACTION), ProbeHazard::DynamicArgs);
        assert_eq!(hazard(interfaces::FUND_AGENT), ProbeHazard::MutatingGuard);
        assert_eq!(hazard(interfaces::UPDATE_LEARNING), ProbeHazard::None);
        assert_eq!(hazard(interfaces::SET_LOGIC_ADDRESS), ProbeHazard::None);
        assert_eq!(hazard(interfaces::PAUSE), ProbeHazard::None);
    }

    #[test]
    fn test_only_tier3_relies_on_declaration() {
        // Every tier-1 and tier-2 probe can be settled by a raw call, so
        // self-declaration is counted once, by its own interface check.
        for spec in TIER1_PROBES.iter().chain(TIER2_PROBES) {
            assert_eq!(spec.hazard().unwrap(), ProbeHazard::None, "{}", spec.signature);
        }
    }

    #[test]
    fn test_extension_probes_are_raw() {
        for kind in ExtensionKind::ALL {
            let probes: Vec<_> = extension_probes(kind).collect();
            assert_eq!(probes.len(), 2);
            for p in probes {
                assert!(!p.in_nfa1);
                assert_eq!(p.hazard().unwrap(), ProbeHazard::None);
            }
        }
    }
}
