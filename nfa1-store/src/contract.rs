//! Callable contract surface.
//!
//! A `Contract` turns calldata into a `CallOutcome` the way deployed
//! bytecode would: unmatched selectors and malformed arguments revert with
//! no data, guard failures revert with an `Error(string)` payload, and any
//! state write attempted during a static call reverts with no data.

use crate::error::StoreError;
use crate::store::AgentStore;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface};
use nfa1_core::bindings::IERC165::{self, IERC165Calls};
use nfa1_core::bindings::IERC721::{self, IERC721Calls};
use nfa1_core::bindings::INFA1::{self, INFA1Calls};
use nfa1_core::bindings::{self, INFA1Store};
use nfa1_core::interfaces::{ERC165, ERC721, NFA1};
use nfa1_core::{CallOutcome, EventLog, InterfaceId, UnixSeconds};

/// Execution context of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Native currency attached to the call
    pub value: U256,
    /// True for `staticcall`/`eth_call`-style reads
    pub is_static: bool,
    pub timestamp: UnixSeconds,
    pub block_number: u64,
}

impl CallContext {
    /// Read-only call from `caller`.
    pub fn static_call(caller: Address, timestamp: UnixSeconds, block_number: u64) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            is_static: true,
            timestamp,
            block_number,
        }
    }

    /// State-changing transaction from `caller`.
    pub fn transaction(caller: Address, timestamp: UnixSeconds, block_number: u64) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            is_static: false,
            timestamp,
            block_number,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Anything deployable at an address of the in-memory ledger.
pub trait Contract: Send {
    /// Deployed bytecode. Must be non-empty.
    fn code(&self) -> Bytes;

    fn call(&mut self, ctx: &CallContext, input: &[u8]) -> CallOutcome;

    /// Logs emitted since the last drain, stamped with the emitter and block.
    fn drain_logs(&mut self, _address: Address, _block_number: u64) -> Vec<EventLog> {
        Vec::new()
    }
}

// ============================================================================
// STORE CONTRACT
// ============================================================================

/// Opaque stand-in for the store's runtime bytecode.
const STORE_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x4e, 0x46, 0x41, 0x31];

/// A call decoded against the store's surface.
enum StoreCall {
    Erc165(IERC165Calls),
    Erc721(IERC721Calls),
    Nfa1(INFA1Calls),
    Mint(INFA1Store::createAgentCall),
}

impl StoreCall {
    /// `None` for unknown selectors and for argument encodings that do not
    /// validate, both of which revert without data.
    fn decode(input: &[u8]) -> Option<Self> {
        let sel: [u8; 4] = input.get(..4)?.try_into().ok()?;
        let call = if IERC165Calls::valid_selector(sel) {
            StoreCall::Erc165(IERC165Calls::abi_decode(input, true).ok()?)
        } else if IERC721Calls::valid_selector(sel) {
            StoreCall::Erc721(IERC721Calls::abi_decode(input, true).ok()?)
        } else if INFA1Calls::valid_selector(sel) {
            StoreCall::Nfa1(INFA1Calls::abi_decode(input, true).ok()?)
        } else if sel == INFA1Store::createAgentCall::SELECTOR {
            StoreCall::Mint(INFA1Store::createAgentCall::abi_decode(input, true).ok()?)
        } else {
            return None;
        };
        Some(call)
    }

    fn is_payable(&self) -> bool {
        matches!(self, StoreCall::Nfa1(INFA1Calls::fundAgent(_)))
    }
}

/// Why a call did not return normally.
enum Failure {
    /// Non-payable value or static write: no data
    Silent,
    /// Guard clause: `Error(string)` data
    Guard(StoreError),
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        Failure::Guard(err)
    }
}

type Dispatch = Result<Vec<u8>, Failure>;

fn non_zero(address: Address) -> Option<Address> {
    (address != Address::ZERO).then_some(address)
}

/// `AgentStore` behind an ABI dispatcher.
#[derive(Debug, Clone)]
pub struct StoreContract {
    store: AgentStore,
}

impl StoreContract {
    pub fn new(store: AgentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AgentStore {
        &mut self.store
    }

    pub fn into_store(self) -> AgentStore {
        self.store
    }

    /// Interfaces this contract declares through ERC-165.
    pub fn supports_interface(id: InterfaceId) -> bool {
        [ERC165.id(), ERC721.id(), NFA1.id()].contains(&id)
    }

    fn dispatch(&mut self, ctx: &CallContext, call: StoreCall) -> Dispatch {
        if !ctx.value.is_zero() && !call.is_payable() {
            return Err(Failure::Silent);
        }
        let store = &self.store;
        match call {
            StoreCall::Erc165(IERC165Calls::supportsInterface(c)) => {
                let supported = Self::supports_interface(c.interfaceId);
                Ok(IERC165::supportsInterfaceCall::abi_encode_returns(&(supported,)))
            }
            StoreCall::Erc721(IERC721Calls::balanceOf(c)) => {
                if c.owner == Address::ZERO {
                    return Err(StoreError::ZeroAddress { field: "owner" }.into());
                }
                let balance = U256::from(store.balance_of(c.owner));
                Ok(IERC721::balanceOfCall::abi_encode_returns(&(balance,)))
            }
            StoreCall::Erc721(IERC721Calls::ownerOf(c)) => {
                let owner = store.owner_of(c.tokenId)?;
                Ok(IERC721::ownerOfCall::abi_encode_returns(&(owner,)))
            }
            StoreCall::Erc721(IERC721Calls::getApproved(c)) => {
                let approved = store.get_approved(c.tokenId)?.unwrap_or(Address::ZERO);
                Ok(IERC721::getApprovedCall::abi_encode_returns(&(approved,)))
            }
            StoreCall::Erc721(IERC721Calls::isApprovedForAll(c)) => {
                let approved = store.is_approved_for_all(c.owner, c.operator);
                Ok(IERC721::isApprovedForAllCall::abi_encode_returns(&(approved,)))
            }
            StoreCall::Nfa1(INFA1Calls::getState(c)) => {
                let state = store.runtime_state(c.tokenId)?;
                Ok(INFA1::getStateCall::abi_encode_returns(&(
                    state.balance,
                    state.status.as_u8(),
                    state.owner,
                    state.delegated_logic.unwrap_or(Address::ZERO),
                    U256::from(state.last_action_time),
                )))
            }
            StoreCall::Nfa1(INFA1Calls::getAgentMetadata(c)) => {
                let metadata = bindings::AgentMetadata::from(store.metadata(c.tokenId)?);
                Ok(INFA1::getAgentMetadataCall::abi_encode_returns(&(metadata,)))
            }
            StoreCall::Nfa1(INFA1Calls::getLearningState(c)) => {
                let learning = store.learning_state(c.tokenId)?;
                Ok(INFA1::getLearningStateCall::abi_encode_returns(&(
                    learning.learning_digest,
                    U256::from(learning.version),
                    U256::from(learning.last_update_time),
                    learning.enabled,
                )))
            }
            StoreCall::Nfa1(INFA1Calls::getLearningRoot(c)) => {
                let digest = store.learning_state(c.tokenId)?.learning_digest;
                Ok(INFA1::getLearningRootCall::abi_encode_returns(&(digest,)))
            }
            StoreCall::Nfa1(INFA1Calls::isLearningEnabled(c)) => {
                let enabled = store.learning_state(c.tokenId)?.enabled;
                Ok(INFA1::isLearningEnabledCall::abi_encode_returns(&(enabled,)))
            }
            StoreCall::Nfa1(INFA1Calls::getLearningVersion(c)) => {
                let version = U256::from(store.learning_state(c.tokenId)?.version);
                Ok(INFA1::getLearningVersionCall::abi_encode_returns(&(version,)))
            }
            StoreCall::Nfa1(INFA1Calls::getLastLearningUpdate(c)) => {
                let updated = U256::from(store.learning_state(c.tokenId)?.last_update_time);
                Ok(INFA1::getLastLearningUpdateCall::abi_encode_returns(&(updated,)))
            }
            write => self.dispatch_write(ctx, write),
        }
    }

    /// Mutating calls. In a static context the write is attempted on a
    /// scratch copy: a guard failure still surfaces as revert data, a write
    /// that would have landed reverts with no data.
    fn dispatch_write(&mut self, ctx: &CallContext, call: StoreCall) -> Dispatch {
        // The lock is the first store of the function body.
        if ctx.is_static && matches!(call, StoreCall::Nfa1(INFA1Calls::executeAction(_))) {
            return Err(Failure::Silent);
        }
        if ctx.is_static {
            let mut scratch = self.store.clone();
            apply_write(&mut scratch, ctx, call)?;
            return Err(Failure::Silent);
        }
        apply_write(&mut self.store, ctx, call)
    }
}

fn apply_write(store: &mut AgentStore, ctx: &CallContext, call: StoreCall) -> Dispatch {
    let caller = ctx.caller;
    match call {
        StoreCall::Erc721(IERC721Calls::approve(c)) => {
            store.approve(caller, non_zero(c.to), c.tokenId)?;
        }
        StoreCall::Erc721(IERC721Calls::setApprovalForAll(c)) => {
            store.set_approval_for_all(caller, c.operator, c.approved);
        }
        StoreCall::Erc721(IERC721Calls::transferFrom(c)) => {
            store.transfer_from(caller, c.from, c.to, c.tokenId)?;
        }
        StoreCall::Erc721(IERC721Calls::safeTransferFrom_0(c)) => {
            store.transfer_from(caller, c.from, c.to, c.tokenId)?;
        }
        StoreCall::Erc721(IERC721Calls::safeTransferFrom_1(c)) => {
            store.transfer_from(caller, c.from, c.to, c.tokenId)?;
        }
        StoreCall::Mint(c) => {
            let token_id = store.mint(
                caller,
                c.to,
                non_zero(c.logicAddress),
                c.metadataURI,
                c.metadata.into(),
                c.learningEnabled,
            )?;
            return Ok(INFA1Store::createAgentCall::abi_encode_returns(&(token_id,)));
        }
        StoreCall::Nfa1(INFA1Calls::executeAction(c)) => {
            store.execute_action(caller, c.tokenId, &c.data, ctx.timestamp)?;
        }
        StoreCall::Nfa1(INFA1Calls::setLogicAddress(c)) => {
            store.set_logic_address(caller, c.tokenId, non_zero(c.newLogic))?;
        }
        StoreCall::Nfa1(INFA1Calls::fundAgent(c)) => {
            store.fund(caller, c.tokenId, ctx.value)?;
        }
        StoreCall::Nfa1(INFA1Calls::updateAgentMetadata(c)) => {
            store.update_metadata(caller, c.tokenId, c.metadata.into())?;
        }
        StoreCall::Nfa1(INFA1Calls::pause(c)) => store.pause(caller, c.tokenId)?,
        StoreCall::Nfa1(INFA1Calls::unpause(c)) => store.unpause(caller, c.tokenId)?,
        StoreCall::Nfa1(INFA1Calls::terminate(c)) => store.terminate(caller, c.tokenId)?,
        StoreCall::Nfa1(INFA1Calls::updateLearning(c)) => {
            let version = u64::try_from(c.newVersion).map_err(|_| {
                StoreError::VersionOutOfRange {
                    proposed: c.newVersion,
                }
            })?;
            store.update_learning(caller, c.tokenId, c.newRoot, version, ctx.timestamp)?;
        }
        _ => return Err(Failure::Silent),
    }
    Ok(Vec::new())
}

impl Contract for StoreContract {
    fn code(&self) -> Bytes {
        Bytes::from_static(STORE_CODE)
    }

    fn call(&mut self, ctx: &CallContext, input: &[u8]) -> CallOutcome {
        let Some(call) = StoreCall::decode(input) else {
            return CallOutcome::empty_revert();
        };
        match self.dispatch(ctx, call) {
            Ok(output) => CallOutcome::success(output),
            Err(Failure::Silent) => CallOutcome::empty_revert(),
            Err(Failure::Guard(err)) => CallOutcome::revert(err.revert_data()),
        }
    }

    fn drain_logs(&mut self, address: Address, block_number: u64) -> Vec<EventLog> {
        self.store
            .drain_events()
            .iter()
            .map(|event| event.to_log(address, block_number))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
