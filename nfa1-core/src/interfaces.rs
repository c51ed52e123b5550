//! Canonical, versioned interface tables.
//!
//! Every identifier the verifier relies on is derived from the explicit
//! signature lists below and pinned by tests. Nothing here is discovered from
//! the target.

use crate::abi::{interface_id, InterfaceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the NFA-1 core signature list.
pub const NFA1_INTERFACE_VERSION: u32 = 1;

/// A named group of canonical function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDef {
    pub name: &'static str,
    pub signatures: &'static [&'static str],
}

impl InterfaceDef {
    /// XOR of every member selector.
    pub fn id(&self) -> InterfaceId {
        interface_id(self.signatures.iter().copied())
    }

    pub fn declares(&self, signature: &str) -> bool {
        self.signatures.contains(&signature)
    }
}

// ============================================================================
// STANDARD INTERFACES
// ============================================================================

pub const SUPPORTS_INTERFACE: &str = "supportsInterface(bytes4)";

pub static ERC165: InterfaceDef = InterfaceDef {
    name: "IERC165",
    signatures: &[SUPPORTS_INTERFACE],
};

pub static ERC721: InterfaceDef = InterfaceDef {
    name: "IERC721",
    signatures: &[
        "balanceOf(address)",
        "ownerOf(uint256)",
        "safeTransferFrom(address,address,uint256,bytes)",
        "safeTransferFrom(address,address,uint256)",
        "transferFrom(address,address,uint256)",
        "approve(address,uint256)",
        "setApprovalForAll(address,bool)",
        "getApproved(uint256)",
        "isApprovedForAll(address,address)",
    ],
};

// ============================================================================
// NFA-1 CORE
// ============================================================================

pub const EXECUTE_ACTION: &str = "executeAction(uint256,bytes)";
pub const SET_LOGIC_ADDRESS: &str = "setLogicAddress(uint256,address)";
pub const FUND_AGENT: &str = "fundAgent(uint256)";
pub const GET_STATE: &str = "getState(uint256)";
pub const GET_AGENT_METADATA: &str = "getAgentMetadata(uint256)";
pub const UPDATE_AGENT_METADATA: &str =
    "updateAgentMetadata(uint256,(string,string,string,string,string,bytes32))";
pub const PAUSE: &str = "pause(uint256)";
pub const UNPAUSE: &str = "unpause(uint256)";
pub const TERMINATE: &str = "terminate(uint256)";
pub const UPDATE_LEARNING: &str = "updateLearning(uint256,bytes32,uint256)";
pub const GET_LEARNING_STATE: &str = "getLearningState(uint256)";
pub const GET_LEARNING_ROOT: &str = "getLearningRoot(uint256)";
pub const IS_LEARNING_ENABLED: &str = "isLearningEnabled(uint256)";
pub const GET_LEARNING_VERSION: &str = "getLearningVersion(uint256)";
pub const GET_LAST_LEARNING_UPDATE: &str = "getLastLearningUpdate(uint256)";

/// Store-specific minting entry point. Not part of the interface identifier.
pub const CREATE_AGENT: &str =
    "createAgent(address,address,string,(string,string,string,string,string,bytes32),bool)";

pub static NFA1: InterfaceDef = InterfaceDef {
    name: "INFA1",
    signatures: &[
        EXECUTE_ACTION,
        SET_LOGIC_ADDRESS,
        FUND_AGENT,
        GET_STATE,
        GET_AGENT_METADATA,
        UPDATE_AGENT_METADATA,
        PAUSE,
        UNPAUSE,
        TERMINATE,
        UPDATE_LEARNING,
        GET_LEARNING_STATE,
        GET_LEARNING_ROOT,
        IS_LEARNING_ENABLED,
        GET_LEARNING_VERSION,
        GET_LAST_LEARNING_UPDATE,
    ],
};

// ============================================================================
// OPTIONAL EXTENSIONS
// ============================================================================

/// Optional capability groups, detected independently of the tier verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionKind {
    Lineage,
    Payment,
    Identity,
    Receipts,
    Compliance,
    LearningModules,
    CircuitBreaker,
}

impl ExtensionKind {
    pub const ALL: [ExtensionKind; 7] = [
        ExtensionKind::Lineage,
        ExtensionKind::Payment,
        ExtensionKind::Identity,
        ExtensionKind::Receipts,
        ExtensionKind::Compliance,
        ExtensionKind::LearningModules,
        ExtensionKind::CircuitBreaker,
    ];

    /// The extension's interface. Its signatures double as the
    /// representative probes: all of them must exist for a positive flag.
    pub fn interface(&self) -> &'static InterfaceDef {
        match self {
            ExtensionKind::Lineage => &LINEAGE,
            ExtensionKind::Payment => &PAYMENT,
            ExtensionKind::Identity => &IDENTITY,
            ExtensionKind::Receipts => &RECEIPTS,
            ExtensionKind::Compliance => &COMPLIANCE,
            ExtensionKind::LearningModules => &LEARNING_MODULES,
            ExtensionKind::CircuitBreaker => &CIRCUIT_BREAKER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Lineage => "Lineage",
            ExtensionKind::Payment => "Payment",
            ExtensionKind::Identity => "Identity",
            ExtensionKind::Receipts => "Receipts",
            ExtensionKind::Compliance => "Compliance",
            ExtensionKind::LearningModules => "LearningModules",
            ExtensionKind::CircuitBreaker => "CircuitBreaker",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub static LINEAGE: InterfaceDef = InterfaceDef {
    name: "INFA1Lineage",
    signatures: &["getParent(uint256)", "getGeneration(uint256)"],
};

pub static PAYMENT: InterfaceDef = InterfaceDef {
    name: "INFA1Payment",
    signatures: &["getPaymentAddress(uint256)", "setPaymentAddress(uint256,address)"],
};

pub static IDENTITY: InterfaceDef = InterfaceDef {
    name: "INFA1Identity",
    signatures: &["getIdentityBinding(uint256)", "bindIdentity(uint256,bytes32)"],
};

pub static RECEIPTS: InterfaceDef = InterfaceDef {
    name: "INFA1Receipts",
    signatures: &["getReceiptCount(uint256)", "getReceipt(uint256,uint256)"],
};

pub static COMPLIANCE: InterfaceDef = InterfaceDef {
    name: "INFA1Compliance",
    signatures: &["getComplianceStatus(uint256)", "isCompliant(uint256)"],
};

pub static LEARNING_MODULES: InterfaceDef = InterfaceDef {
    name: "INFA1LearningModules",
    signatures: &["getLearningModule(uint256)", "registerLearningModule(uint256,address)"],
};

pub static CIRCUIT_BREAKER: InterfaceDef = InterfaceDef {
    name: "INFA1CircuitBreaker",
    signatures: &["isGloballyPaused()", "setGlobalPause(bool)"],
};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::FunctionSignature;
    use std::collections::HashSet;

    fn all_defs() -> Vec<&'static InterfaceDef> {
        let mut defs = vec![&ERC165, &ERC721, &NFA1];
        defs.extend(ExtensionKind::ALL.iter().map(|k| k.interface()));
        defs
    }

    #[test]
    fn test_erc165_id() {
        assert_eq!(ERC165.id().0, [0x01, 0xff, 0xc9, 0xa7]);
    }

    #[test]
    fn test_erc721_id() {
        assert_eq!(ERC721.id().0, [0x80, 0xac, 0x58, 0xcd]);
    }

    #[test]
    fn test_nfa1_id_matches_independent_fold() {
        let mut acc = [0u8; 4];
        for sig in NFA1.signatures.iter().rev() {
            let sel = crate::abi::selector(sig);
            for (a, b) in acc.iter_mut().zip(sel.0.iter()) {
                *a ^= b;
            }
        }
        assert_eq!(NFA1.id().0, acc);
    }

    #[test]
    fn test_every_signature_parses() {
        for def in all_defs() {
            for sig in def.signatures {
                assert!(FunctionSignature::parse(sig).is_ok(), "{} in {}", sig, def.name);
            }
        }
        assert!(FunctionSignature::parse(CREATE_AGENT).is_ok());
    }

    #[test]
    fn test_no_duplicate_signatures_within_interfaces() {
        for def in all_defs() {
            let unique: HashSet<_> = def.signatures.iter().collect();
            assert_eq!(unique.len(), def.signatures.len(), "{}", def.name);
        }
    }

    #[test]
    fn test_interface_ids_are_distinct() {
        let ids: HashSet<_> = all_defs().iter().map(|d| d.id()).collect();
        assert_eq!(ids.len(), all_defs().len());
    }

    #[test]
    fn test_minting_is_outside_core_identifier() {
        assert!(!NFA1.declares(CREATE_AGENT));
        assert!(NFA1.declares(EXECUTE_ACTION));
    }

    #[test]
    fn test_extension_probes_are_simple() {
        for kind in ExtensionKind::ALL {
            for sig in kind.interface().signatures {
                let parsed = FunctionSignature::parse(sig).unwrap();
                assert!(!parsed.has_dynamic_params(), "{} ({})", sig, kind);
            }
        }
    }
}
