//! Mock contracts and fixtures.

use alloy_primitives::{Address, Bytes, Selector};
use alloy_sol_types::SolCall;
use nfa1_core::bindings::IERC165::supportsInterfaceCall;
use nfa1_core::interfaces::{ExtensionKind, InterfaceDef, NFA1};
use nfa1_core::{encode_revert_reason, selector, AgentMetadata, CallOutcome, EventLog, InterfaceId};
use nfa1_store::{AgentStore, CallContext, Contract, StoreContract};
use std::collections::{BTreeSet, HashMap};

/// Opaque runtime bytecode for table-driven mocks.
const MOCK_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x00];

fn is_interface_query(input: &[u8]) -> bool {
    input.starts_with(&supportsInterfaceCall::SELECTOR)
}

/// `supportsInterface` return data.
fn interface_answer(declared: bool) -> CallOutcome {
    CallOutcome::success(supportsInterfaceCall::abi_encode_returns(&(declared,)))
}

// ============================================================================
// SELECTOR CONTRACT
// ============================================================================

/// Contract answering from a fixed selector table.
///
/// Unlisted selectors revert with no data. `supportsInterface` is answered
/// from the declared set once any interface is declared; before that it is
/// treated like any other selector.
#[derive(Debug, Clone, Default)]
pub struct SelectorContract {
    responses: HashMap<Selector, CallOutcome>,
    declared: BTreeSet<InterfaceId>,
    erc165: bool,
}

impl SelectorContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `supportsInterface(id)` with true for `interface`.
    pub fn declare(mut self, interface: &InterfaceDef) -> Self {
        self.erc165 = true;
        self.declared.insert(interface.id());
        self
    }

    /// Answer `supportsInterface` for every id, declaring nothing.
    pub fn with_erc165(mut self) -> Self {
        self.erc165 = true;
        self
    }

    pub fn respond(mut self, signature: &str, outcome: CallOutcome) -> Self {
        self.responses.insert(selector(signature), outcome);
        self
    }

    /// Make `signature` exist behind an authorization guard.
    pub fn guarded(self, signature: &str) -> Self {
        self.respond(
            signature,
            CallOutcome::revert(encode_revert_reason("caller is not authorized")),
        )
    }

    /// Every function of `interface` exists behind a guard.
    pub fn implement(self, interface: &InterfaceDef) -> Self {
        interface
            .signatures
            .iter()
            .fold(self, |contract, signature| contract.guarded(signature))
    }
}

impl Contract for SelectorContract {
    fn code(&self) -> Bytes {
        Bytes::from_static(MOCK_CODE)
    }

    fn call(&mut self, _ctx: &CallContext, input: &[u8]) -> CallOutcome {
        if input.len() < 4 {
            return CallOutcome::empty_revert();
        }
        if self.erc165 && is_interface_query(input) {
            let declared = supportsInterfaceCall::abi_decode(input, true)
                .map(|query| self.declared.contains(&query.interfaceId))
                .unwrap_or(false);
            return interface_answer(declared);
        }
        self.responses
            .get(&Selector::from_slice(&input[..4]))
            .cloned()
            .unwrap_or_else(CallOutcome::empty_revert)
    }
}

// ============================================================================
// WRAPPERS
// ============================================================================

/// Wraps a contract so it denies interface queries: every one by default,
/// or only the listed interfaces.
pub struct Undeclared<C> {
    inner: C,
    hidden: Option<BTreeSet<InterfaceId>>,
}

impl<C: Contract> Undeclared<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            hidden: None,
        }
    }

    /// Deny only `interfaces`; other queries reach the inner contract.
    pub fn only(inner: C, interfaces: &[&InterfaceDef]) -> Self {
        Self {
            inner,
            hidden: Some(interfaces.iter().map(|def| def.id()).collect()),
        }
    }

    fn hides(&self, input: &[u8]) -> bool {
        let Some(hidden) = &self.hidden else {
            return true;
        };
        supportsInterfaceCall::abi_decode(input, true)
            .map(|query| hidden.contains(&query.interfaceId))
            .unwrap_or(false)
    }
}

impl<C: Contract> Contract for Undeclared<C> {
    fn code(&self) -> Bytes {
        self.inner.code()
    }

    fn call(&mut self, ctx: &CallContext, input: &[u8]) -> CallOutcome {
        if is_interface_query(input) && self.hides(input) {
            return interface_answer(false);
        }
        self.inner.call(ctx, input)
    }

    fn drain_logs(&mut self, address: Address, block_number: u64) -> Vec<EventLog> {
        self.inner.drain_logs(address, block_number)
    }
}

/// Wraps a contract with extra extension functions, each behind a guard.
pub struct WithExtensions<C> {
    inner: C,
    extras: SelectorContract,
}

impl<C: Contract> WithExtensions<C> {
    pub fn new(inner: C, kinds: &[ExtensionKind]) -> Self {
        let extras = kinds
            .iter()
            .fold(SelectorContract::new(), |extras, kind| {
                extras.implement(kind.interface())
            });
        Self { inner, extras }
    }
}

impl<C: Contract> Contract for WithExtensions<C> {
    fn code(&self) -> Bytes {
        self.inner.code()
    }

    fn call(&mut self, ctx: &CallContext, input: &[u8]) -> CallOutcome {
        match self.extras.call(ctx, input) {
            outcome if outcome == CallOutcome::empty_revert() => self.inner.call(ctx, input),
            outcome => outcome,
        }
    }

    fn drain_logs(&mut self, address: Address, block_number: u64) -> Vec<EventLog> {
        self.inner.drain_logs(address, block_number)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made targets.

    use super::*;
    use alloy_primitives::U256;

    pub const ADMIN: Address = Address::with_last_byte(0xAD);
    pub const AGENT_OWNER: Address = Address::with_last_byte(0xA1);
    pub const LOGIC: Address = Address::with_last_byte(0x10);

    pub const STORE_ADDRESS: Address = Address::with_last_byte(0x51);
    pub const UNRELATED_ADDRESS: Address = Address::with_last_byte(0x52);
    pub const EOA_ADDRESS: Address = Address::with_last_byte(0x53);

    pub fn sample_metadata() -> AgentMetadata {
        AgentMetadata {
            persona: "{\"role\":\"scout\"}".to_string(),
            experience: "market research".to_string(),
            voice_ref: None,
            animation_ref: Some("ipfs://anim".to_string()),
            vault_location: "ipfs://vault".to_string(),
            vault_digest: nfa1_core::compute_vault_digest(b"vault"),
        }
    }

    /// Store with one minted agent (token 1, the first placeholder id).
    pub fn agent_store() -> AgentStore {
        let mut store = AgentStore::new(ADMIN);
        // Setup against a fresh store cannot fail.
        let _ = store.mint(
            ADMIN,
            AGENT_OWNER,
            Some(LOGIC),
            "ipfs://agent/1".to_string(),
            sample_metadata(),
            true,
        );
        store
    }

    /// The minimal conformant store: full NFA-1 surface, self-declared.
    pub fn conformant_store() -> StoreContract {
        StoreContract::new(agent_store())
    }

    /// Conformant store with no minted tokens.
    pub fn empty_store() -> StoreContract {
        StoreContract::new(AgentStore::new(ADMIN))
    }

    /// A token-like contract unrelated to NFA-1 (ERC-20 surface, no ERC-165).
    pub fn unrelated_contract() -> SelectorContract {
        SelectorContract::new()
            .respond("totalSupply()", CallOutcome::success(U256::from(1_000u64).to_be_bytes_vec()))
            .guarded("transfer(address,uint256)")
            .respond("balanceOf(address)", CallOutcome::success(vec![0u8; 32]))
    }

    /// Conformant surface that never declares anything via ERC-165.
    pub fn undeclared_store() -> Undeclared<StoreContract> {
        Undeclared::new(conformant_store())
    }

    /// Conformant surface that declares ERC-721 but not NFA-1.
    pub fn erc721_only_store() -> Undeclared<StoreContract> {
        Undeclared::only(conformant_store(), &[&NFA1])
    }

    /// Every NFA-1 function guarded, NFA-1 declared, no ERC-721.
    pub fn declared_surface() -> SelectorContract {
        SelectorContract::new().declare(&NFA1).implement(&NFA1)
    }
}
