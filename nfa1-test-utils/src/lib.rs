//! NFA-1 Test Utilities
//!
//! Centralized test infrastructure for the NFA-1 workspace:
//! - `MockChain`, an in-memory ledger implementing the verifier's traits
//! - Table-driven mock contracts and wrappers
//! - Fixtures for common targets
//! - Proptest generators

pub mod chain;
pub mod contracts;

pub use chain::{Fault, MockChain, BLOCK_TIME, GENESIS_TIMESTAMP};
pub use contracts::{fixtures, SelectorContract, Undeclared, WithExtensions};

// Re-export the types tests reach for most.
pub use nfa1_core::{
    AgentMetadata, AgentStatus, AuditError, AuditReport, CallOutcome, ChainError,
    ExtensionFlags, ProbeOutcome, QuickCheck, Verdict, VerifierConfig,
};
pub use nfa1_store::{AgentStore, CallContext, Contract, StoreContract};
pub use nfa1_verifier::{ChainReader, LogSource, Verifier};

use alloy_primitives::Address;
use std::sync::Arc;

/// A chain with the fixture targets deployed: the conformant store at
/// `STORE_ADDRESS` and the unrelated contract at `UNRELATED_ADDRESS`.
pub fn fixture_chain() -> Arc<MockChain> {
    let chain = MockChain::new();
    chain.deploy(fixtures::STORE_ADDRESS, fixtures::conformant_store());
    chain.deploy(fixtures::UNRELATED_ADDRESS, fixtures::unrelated_contract());
    Arc::new(chain)
}

/// A chain with `contract` deployed at `address`, plus a verifier over it.
pub fn verifier_for(
    address: Address,
    contract: impl Contract + 'static,
) -> (Arc<MockChain>, Verifier<Arc<MockChain>>) {
    let chain = Arc::new(MockChain::new());
    chain.deploy(address, contract);
    (chain.clone(), Verifier::new(chain))
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for NFA-1 inputs.

    use super::*;
    use alloy_primitives::{B256, U256};
    use nfa1_core::interfaces::{ERC721, NFA1};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// Generate an arbitrary address.
    pub fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }

    pub fn arb_b256() -> impl Strategy<Value = B256> {
        any::<[u8; 32]>().prop_map(B256::from)
    }

    /// Small token ids, the range placeholders probe.
    pub fn arb_token_id() -> impl Strategy<Value = U256> {
        (1u64..64).prop_map(U256::from)
    }

    pub fn arb_agent_status() -> impl Strategy<Value = AgentStatus> {
        prop_oneof![
            Just(AgentStatus::Active),
            Just(AgentStatus::Paused),
            Just(AgentStatus::Terminated),
        ]
    }

    fn arb_optional_text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-z0-9:/]{1,24}")
    }

    pub fn arb_metadata() -> impl Strategy<Value = AgentMetadata> {
        (
            "[a-zA-Z ]{0,32}",
            "[a-zA-Z ]{0,32}",
            arb_optional_text(),
            arb_optional_text(),
            "ipfs://[a-z0-9]{8,16}",
            arb_b256(),
        )
            .prop_map(
                |(persona, experience, voice_ref, animation_ref, vault_location, vault_digest)| {
                    AgentMetadata {
                        persona,
                        experience,
                        voice_ref,
                        animation_ref,
                        vault_location,
                        vault_digest,
                    }
                },
            )
    }

    /// A contract surface: which NFA-1 functions exist and which interfaces
    /// are self-declared.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Surface {
        pub declares_erc721: bool,
        pub declares_nfa1: bool,
        pub functions: BTreeSet<&'static str>,
    }

    impl Surface {
        /// Whether `other` has everything this surface has.
        pub fn is_subset_of(&self, other: &Surface) -> bool {
            (!self.declares_erc721 || other.declares_erc721)
                && (!self.declares_nfa1 || other.declares_nfa1)
                && self.functions.is_subset(&other.functions)
        }

        pub fn union(&self, other: &Surface) -> Surface {
            Surface {
                declares_erc721: self.declares_erc721 || other.declares_erc721,
                declares_nfa1: self.declares_nfa1 || other.declares_nfa1,
                functions: self.functions.union(&other.functions).copied().collect(),
            }
        }

        /// Table-driven contract exposing this surface. Every present
        /// function answers with a guard revert.
        pub fn build(&self) -> SelectorContract {
            let mut contract = SelectorContract::new().with_erc165();
            if self.declares_erc721 {
                contract = contract.declare(&ERC721);
            }
            if self.declares_nfa1 {
                contract = contract.declare(&NFA1);
            }
            self.functions
                .iter()
                .fold(contract, |contract, signature| contract.guarded(signature))
        }
    }

    pub fn arb_surface() -> impl Strategy<Value = Surface> {
        (
            any::<bool>(),
            any::<bool>(),
            proptest::sample::subsequence(NFA1.signatures.to_vec(), 0..=NFA1.signatures.len()),
        )
            .prop_map(|(declares_erc721, declares_nfa1, functions)| Surface {
                declares_erc721,
                declares_nfa1,
                functions: functions.into_iter().collect(),
            })
    }
}
