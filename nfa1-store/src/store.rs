//! In-memory agent token store.
//!
//! `AgentStore` is the state machine behind the reference contract. It owns
//! the ERC-721 ownership records and the per-token agent data, enforces the
//! authorization and gating rules, and appends an event for every accepted
//! mutation. It knows nothing about calldata; see `contract` for that.

use crate::error::{StoreError, StoreResult};
use alloy_primitives::{keccak256, Address, LogData, B256, U256};
use alloy_sol_types::SolEvent;
use nfa1_core::bindings::{IERC721, INFA1};
use nfa1_core::{
    AgentEventKind, AgentMetadata, AgentStatus, EventLog, LearningState, RuntimeState, TokenId,
    UnixSeconds,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// EVENTS
// ============================================================================

/// An event emitted by an accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    AgentCreated {
        token_id: TokenId,
        owner: Address,
        logic: Option<Address>,
    },
    ActionExecuted {
        token_id: TokenId,
        logic: Address,
        payload_digest: B256,
    },
    LogicUpdated {
        token_id: TokenId,
        old_logic: Option<Address>,
        new_logic: Option<Address>,
    },
    AgentFunded {
        token_id: TokenId,
        funder: Address,
        amount: U256,
    },
    StatusChanged {
        token_id: TokenId,
        status: AgentStatus,
    },
    MetadataUpdated {
        token_id: TokenId,
    },
    LearningUpdated {
        token_id: TokenId,
        old_digest: B256,
        new_digest: B256,
        version: u64,
    },
    Transfer {
        from: Address,
        to: Address,
        token_id: TokenId,
    },
}

fn opt_address(address: Option<Address>) -> Address {
    address.unwrap_or(Address::ZERO)
}

impl StoreEvent {
    pub fn kind(&self) -> AgentEventKind {
        match self {
            StoreEvent::AgentCreated { .. } => AgentEventKind::AgentCreated,
            StoreEvent::ActionExecuted { .. } => AgentEventKind::ActionExecuted,
            StoreEvent::LogicUpdated { .. } => AgentEventKind::LogicUpdated,
            StoreEvent::AgentFunded { .. } => AgentEventKind::AgentFunded,
            StoreEvent::StatusChanged { .. } => AgentEventKind::StatusChanged,
            StoreEvent::MetadataUpdated { .. } => AgentEventKind::MetadataUpdated,
            StoreEvent::LearningUpdated { .. } => AgentEventKind::LearningUpdated,
            StoreEvent::Transfer { .. } => AgentEventKind::Transfer,
        }
    }

    /// Topics (topic0 first) and the ABI-encoded non-indexed fields.
    fn log_data(&self) -> LogData {
        match *self {
            StoreEvent::AgentCreated {
                token_id,
                owner,
                logic,
            } => INFA1::AgentCreated {
                tokenId: token_id,
                owner,
                logicAddress: opt_address(logic),
            }
            .encode_log_data(),
            StoreEvent::ActionExecuted {
                token_id,
                logic,
                payload_digest,
            } => INFA1::ActionExecuted {
                tokenId: token_id,
                logicAddress: logic,
                payloadDigest: payload_digest,
            }
            .encode_log_data(),
            StoreEvent::LogicUpdated {
                token_id,
                old_logic,
                new_logic,
            } => INFA1::LogicUpdated {
                tokenId: token_id,
                oldLogic: opt_address(old_logic),
                newLogic: opt_address(new_logic),
            }
            .encode_log_data(),
            StoreEvent::AgentFunded {
                token_id,
                funder,
                amount,
            } => INFA1::AgentFunded {
                tokenId: token_id,
                funder,
                amount,
            }
            .encode_log_data(),
            StoreEvent::StatusChanged { token_id, status } => INFA1::StatusChanged {
                tokenId: token_id,
                newStatus: status.as_u8(),
            }
            .encode_log_data(),
            StoreEvent::MetadataUpdated { token_id } => {
                INFA1::MetadataUpdated { tokenId: token_id }.encode_log_data()
            }
            StoreEvent::LearningUpdated {
                token_id,
                old_digest,
                new_digest,
                version,
            } => INFA1::LearningUpdated {
                tokenId: token_id,
                oldRoot: old_digest,
                newRoot: new_digest,
                version: U256::from(version),
            }
            .encode_log_data(),
            StoreEvent::Transfer { from, to, token_id } => IERC721::Transfer {
                from,
                to,
                tokenId: token_id,
            }
            .encode_log_data(),
        }
    }

    /// Render as a raw ledger log emitted by `address` in `block_number`.
    pub fn to_log(&self, address: Address, block_number: u64) -> EventLog {
        let log = self.log_data();
        EventLog {
            address,
            block_number,
            topics: log.topics().to_vec(),
            data: log.data,
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Everything the store keeps for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub runtime: RuntimeState,
    pub metadata: AgentMetadata,
    pub metadata_uri: String,
    pub learning: LearningState,
}

/// Reference agent token store.
#[derive(Debug, Clone)]
pub struct AgentStore {
    admin: Address,
    learning_updater: Option<Address>,
    next_token_id: u64,
    agents: BTreeMap<TokenId, AgentRecord>,
    holdings: HashMap<Address, u64>,
    approvals: HashMap<TokenId, Address>,
    operators: BTreeSet<(Address, Address)>,
    executing: bool,
    events: Vec<StoreEvent>,
}

impl AgentStore {
    /// Empty store administered by `admin`. Token ids start at 1.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            learning_updater: None,
            next_token_id: 1,
            agents: BTreeMap::new(),
            holdings: HashMap::new(),
            approvals: HashMap::new(),
            operators: BTreeSet::new(),
            executing: false,
            events: Vec::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn learning_updater(&self) -> Option<Address> {
        self.learning_updater
    }

    /// Designate the account (besides the owner) allowed to push learning
    /// updates for every token.
    pub fn set_learning_updater(
        &mut self,
        caller: Address,
        updater: Option<Address>,
    ) -> StoreResult<()> {
        self.require_admin(caller)?;
        self.learning_updater = updater;
        Ok(())
    }

    /// Mint a new agent to `to`.
    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        logic: Option<Address>,
        metadata_uri: String,
        metadata: AgentMetadata,
        learning_enabled: bool,
    ) -> StoreResult<TokenId> {
        self.require_admin(caller)?;
        if to == Address::ZERO {
            return Err(StoreError::ZeroAddress { field: "to" });
        }

        let token_id = TokenId::from(self.next_token_id);
        self.next_token_id += 1;

        self.agents.insert(
            token_id,
            AgentRecord {
                runtime: RuntimeState::new(to, logic),
                metadata,
                metadata_uri,
                learning: LearningState::new(learning_enabled),
            },
        );
        *self.holdings.entry(to).or_default() += 1;

        self.events.push(StoreEvent::Transfer {
            from: Address::ZERO,
            to,
            token_id,
        });
        self.events.push(StoreEvent::AgentCreated {
            token_id,
            owner: to,
            logic,
        });
        Ok(token_id)
    }

    // ------------------------------------------------------------------------
    // ERC-721 subset
    // ------------------------------------------------------------------------

    pub fn owner_of(&self, token_id: TokenId) -> StoreResult<Address> {
        Ok(self.record(token_id)?.runtime.owner)
    }

    pub fn balance_of(&self, owner: Address) -> u64 {
        self.holdings.get(&owner).copied().unwrap_or(0)
    }

    pub fn get_approved(&self, token_id: TokenId) -> StoreResult<Option<Address>> {
        self.record(token_id)?;
        Ok(self.approvals.get(&token_id).copied())
    }

    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.contains(&(owner, operator))
    }

    /// Approve `spender` for one token. `None` clears the approval.
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Option<Address>,
        token_id: TokenId,
    ) -> StoreResult<()> {
        let owner = self.owner_of(token_id)?;
        if caller != owner && !self.is_approved_for_all(owner, caller) {
            return Err(StoreError::NotAuthorized {
                caller,
                action: "approve",
            });
        }
        match spender {
            Some(spender) => self.approvals.insert(token_id, spender),
            None => self.approvals.remove(&token_id),
        };
        Ok(())
    }

    pub fn set_approval_for_all(&mut self, caller: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.insert((caller, operator));
        } else {
            self.operators.remove(&(caller, operator));
        }
    }

    /// Move a token between accounts. Never gated by agent status; the
    /// runtime owner follows the ownership record.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> StoreResult<()> {
        let owner = self.owner_of(token_id)?;
        if owner != from {
            return Err(StoreError::WrongOwner {
                token_id,
                claimed: from,
            });
        }
        if to == Address::ZERO {
            return Err(StoreError::ZeroAddress { field: "to" });
        }
        if !self.is_owner_or_approved(caller, token_id)? {
            return Err(StoreError::NotAuthorized {
                caller,
                action: "transfer",
            });
        }

        self.approvals.remove(&token_id);
        if let Some(count) = self.holdings.get_mut(&from) {
            *count = count.saturating_sub(1);
        }
        *self.holdings.entry(to).or_default() += 1;
        self.record_mut(token_id)?.runtime.owner = to;

        self.events.push(StoreEvent::Transfer { from, to, token_id });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Agent operations
    // ------------------------------------------------------------------------

    /// Run a delegated action. The payload is handed to the logic contract
    /// off-ledger; the store records its digest and the action time.
    pub fn execute_action(
        &mut self,
        caller: Address,
        token_id: TokenId,
        payload: &[u8],
        now: UnixSeconds,
    ) -> StoreResult<B256> {
        if self.executing {
            return Err(StoreError::Reentrancy);
        }
        self.executing = true;
        let result = self.execute_action_locked(caller, token_id, payload, now);
        self.executing = false;
        result
    }

    fn execute_action_locked(
        &mut self,
        caller: Address,
        token_id: TokenId,
        payload: &[u8],
        now: UnixSeconds,
    ) -> StoreResult<B256> {
        self.require_owner_or_approved(caller, token_id, "execute action")?;
        let runtime = &self.record(token_id)?.runtime;
        if runtime.status != AgentStatus::Active {
            return Err(StoreError::AgentNotActive {
                token_id,
                status: runtime.status,
            });
        }
        let logic = runtime
            .delegated_logic
            .ok_or(StoreError::NoDelegatedLogic { token_id })?;

        let payload_digest = keccak256(payload);
        let runtime = &mut self.record_mut(token_id)?.runtime;
        runtime.last_action_time = runtime.last_action_time.max(now);

        self.events.push(StoreEvent::ActionExecuted {
            token_id,
            logic,
            payload_digest,
        });
        Ok(payload_digest)
    }

    pub fn set_logic_address(
        &mut self,
        caller: Address,
        token_id: TokenId,
        logic: Option<Address>,
    ) -> StoreResult<()> {
        self.require_owner_or_approved(caller, token_id, "set logic")?;
        self.require_not_terminated(token_id)?;

        let runtime = &mut self.record_mut(token_id)?.runtime;
        let old_logic = std::mem::replace(&mut runtime.delegated_logic, logic);

        self.events.push(StoreEvent::LogicUpdated {
            token_id,
            old_logic,
            new_logic: logic,
        });
        Ok(())
    }

    /// Credit native currency to an agent. Anyone may fund any agent.
    pub fn fund(&mut self, caller: Address, token_id: TokenId, amount: U256) -> StoreResult<()> {
        let runtime = &mut self.record_mut(token_id)?.runtime;
        runtime.balance = runtime.balance.saturating_add(amount);

        self.events.push(StoreEvent::AgentFunded {
            token_id,
            funder: caller,
            amount,
        });
        Ok(())
    }

    pub fn pause(&mut self, caller: Address, token_id: TokenId) -> StoreResult<()> {
        self.transition(caller, token_id, AgentStatus::Paused)
    }

    pub fn unpause(&mut self, caller: Address, token_id: TokenId) -> StoreResult<()> {
        self.transition(caller, token_id, AgentStatus::Active)
    }

    /// Retire an agent for good. Learning is switched off in the same step.
    pub fn terminate(&mut self, caller: Address, token_id: TokenId) -> StoreResult<()> {
        self.transition(caller, token_id, AgentStatus::Terminated)
    }

    fn transition(
        &mut self,
        caller: Address,
        token_id: TokenId,
        next: AgentStatus,
    ) -> StoreResult<()> {
        self.require_owner_or_approved(caller, token_id, "change status")?;
        let record = self.record_mut(token_id)?;
        let current = record.runtime.status;
        if current.is_terminal() {
            return Err(StoreError::AgentTerminated { token_id });
        }
        if !current.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        record.runtime.status = next;
        if next.is_terminal() {
            record.learning.enabled = false;
        }

        self.events.push(StoreEvent::StatusChanged {
            token_id,
            status: next,
        });
        Ok(())
    }

    pub fn update_metadata(
        &mut self,
        caller: Address,
        token_id: TokenId,
        metadata: AgentMetadata,
    ) -> StoreResult<()> {
        self.require_owner_or_approved(caller, token_id, "update metadata")?;
        self.require_not_terminated(token_id)?;
        self.record_mut(token_id)?.metadata = metadata;

        self.events.push(StoreEvent::MetadataUpdated { token_id });
        Ok(())
    }

    /// Commit a new learning digest. Rejected without effect unless the
    /// version strictly increases.
    pub fn update_learning(
        &mut self,
        caller: Address,
        token_id: TokenId,
        new_digest: B256,
        new_version: u64,
        now: UnixSeconds,
    ) -> StoreResult<()> {
        let owner = self.owner_of(token_id)?;
        if caller != owner && Some(caller) != self.learning_updater {
            return Err(StoreError::NotAuthorized {
                caller,
                action: "update learning",
            });
        }
        self.require_not_terminated(token_id)?;

        let learning = &mut self.record_mut(token_id)?.learning;
        if !learning.enabled {
            return Err(StoreError::LearningDisabled { token_id });
        }
        if !learning.accepts_version(new_version) {
            return Err(StoreError::StaleLearningVersion {
                current: learning.version,
                proposed: new_version,
            });
        }

        let old_digest = std::mem::replace(&mut learning.learning_digest, new_digest);
        learning.version = new_version;
        learning.last_update_time = now;

        self.events.push(StoreEvent::LearningUpdated {
            token_id,
            old_digest,
            new_digest,
            version: new_version,
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn runtime_state(&self, token_id: TokenId) -> StoreResult<&RuntimeState> {
        Ok(&self.record(token_id)?.runtime)
    }

    pub fn metadata(&self, token_id: TokenId) -> StoreResult<&AgentMetadata> {
        Ok(&self.record(token_id)?.metadata)
    }

    pub fn metadata_uri(&self, token_id: TokenId) -> StoreResult<&str> {
        Ok(&self.record(token_id)?.metadata_uri)
    }

    pub fn learning_state(&self, token_id: TokenId) -> StoreResult<&LearningState> {
        Ok(&self.record(token_id)?.learning)
    }

    pub fn token_ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.agents.keys().copied()
    }

    pub fn total_supply(&self) -> usize {
        self.agents.len()
    }

    /// Events emitted since the last drain.
    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------------

    fn record(&self, token_id: TokenId) -> StoreResult<&AgentRecord> {
        self.agents
            .get(&token_id)
            .ok_or(StoreError::NonexistentToken { token_id })
    }

    fn record_mut(&mut self, token_id: TokenId) -> StoreResult<&mut AgentRecord> {
        self.agents
            .get_mut(&token_id)
            .ok_or(StoreError::NonexistentToken { token_id })
    }

    fn require_admin(&self, caller: Address) -> StoreResult<()> {
        if caller != self.admin {
            return Err(StoreError::NotAdmin { caller });
        }
        Ok(())
    }

    fn is_owner_or_approved(&self, caller: Address, token_id: TokenId) -> StoreResult<bool> {
        let owner = self.owner_of(token_id)?;
        Ok(caller == owner
            || self.approvals.get(&token_id) == Some(&caller)
            || self.is_approved_for_all(owner, caller))
    }

    fn require_owner_or_approved(
        &self,
        caller: Address,
        token_id: TokenId,
        action: &'static str,
    ) -> StoreResult<()> {
        if !self.is_owner_or_approved(caller, token_id)? {
            return Err(StoreError::NotAuthorized { caller, action });
        }
        Ok(())
    }

    fn require_not_terminated(&self, token_id: TokenId) -> StoreResult<()> {
        if self.record(token_id)?.runtime.status.is_terminal() {
            return Err(StoreError::AgentTerminated { token_id });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
