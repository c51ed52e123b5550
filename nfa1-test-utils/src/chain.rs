//! In-memory ledger.

use alloy_primitives::{Address, Bytes, Selector, U256};
use async_trait::async_trait;
use nfa1_core::{CallOutcome, ChainError, EventLog, LogFilter, UnixSeconds};
use nfa1_store::{CallContext, Contract};
use nfa1_verifier::{ChainReader, LogSource};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Genesis timestamp of every `MockChain`.
pub const GENESIS_TIMESTAMP: UnixSeconds = 1_700_000_000;

/// Seconds between mined blocks.
pub const BLOCK_TIME: UnixSeconds = 12;

/// Injected misbehavior for calls to one selector of one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Never answers
    Hang,
    /// Answers after a delay
    Delay(Duration),
    /// Fails at the transport level
    Fail(ChainError),
}

struct ChainState {
    contracts: HashMap<Address, Box<dyn Contract>>,
    faults: HashMap<(Address, Selector), Fault>,
    logs: Vec<EventLog>,
    block_number: u64,
    timestamp: UnixSeconds,
    static_calls: Vec<(Address, Bytes)>,
    code_failure: Option<ChainError>,
}

/// In-memory ledger implementing `ChainReader` and `LogSource`.
///
/// Addresses without a deployed contract behave like externally owned
/// accounts: no code, and calls succeed with empty return data.
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            state: Mutex::new(ChainState {
                contracts: HashMap::new(),
                faults: HashMap::new(),
                logs: Vec::new(),
                block_number: 1,
                timestamp: GENESIS_TIMESTAMP,
                static_calls: Vec::new(),
                code_failure: None,
            }),
        }
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deploy `contract` at `address`, collecting any logs its setup emitted
    /// into the current block.
    pub fn deploy(&self, address: Address, contract: impl Contract + 'static) {
        let mut state = self.state();
        let mut contract: Box<dyn Contract> = Box::new(contract);
        let block = state.block_number;
        let logs = contract.drain_logs(address, block);
        state.logs.extend(logs);
        state.contracts.insert(address, contract);
    }

    /// Submit a state-changing transaction and mine it into a new block.
    pub fn transact(&self, from: Address, to: Address, input: &[u8], value: U256) -> CallOutcome {
        let mut state = self.state();
        state.block_number += 1;
        state.timestamp += BLOCK_TIME;
        let ctx = CallContext::transaction(from, state.timestamp, state.block_number)
            .with_value(value);

        let block = state.block_number;
        let Some(contract) = state.contracts.get_mut(&to) else {
            return CallOutcome::success(Vec::new());
        };
        let outcome = contract.call(&ctx, input);
        let logs = contract.drain_logs(to, block);
        if outcome.is_success() {
            state.logs.extend(logs);
        }
        outcome
    }

    /// Mine `count` empty blocks.
    pub fn advance_blocks(&self, count: u64) {
        let mut state = self.state();
        state.block_number += count;
        state.timestamp += count * BLOCK_TIME;
    }

    /// Misbehave on every static call to `selector` at `address`.
    pub fn inject_fault(&self, address: Address, selector: Selector, fault: Fault) {
        self.state().faults.insert((address, selector), fault);
    }

    /// Fail every code lookup with `error`.
    pub fn fail_code_lookups(&self, error: ChainError) {
        self.state().code_failure = Some(error);
    }

    /// Every static call issued so far, in order.
    pub fn static_calls(&self) -> Vec<(Address, Bytes)> {
        self.state().static_calls.clone()
    }

    /// Whether any static call to `address` started with `selector`.
    pub fn was_called(&self, address: Address, selector: Selector) -> bool {
        self.state()
            .static_calls
            .iter()
            .any(|(to, data)| *to == address && data.starts_with(selector.as_slice()))
    }

    pub fn current_block(&self) -> u64 {
        self.state().block_number
    }

    pub fn current_timestamp(&self) -> UnixSeconds {
        self.state().timestamp
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        let state = self.state();
        if let Some(err) = &state.code_failure {
            return Err(err.clone());
        }
        Ok(state
            .contracts
            .get(&address)
            .map(|c| c.code())
            .unwrap_or_default())
    }

    async fn static_call(&self, to: Address, data: Bytes) -> Result<CallOutcome, ChainError> {
        let fault = {
            let mut state = self.state();
            state.static_calls.push((to, data.clone()));
            data.get(..4)
                .map(Selector::from_slice)
                .and_then(|sel| state.faults.get(&(to, sel)).cloned())
        };

        match fault {
            Some(Fault::Hang) => std::future::pending::<()>().await,
            Some(Fault::Delay(delay)) => tokio::time::sleep(delay).await,
            Some(Fault::Fail(err)) => return Err(err),
            None => {}
        }

        let mut state = self.state();
        let ctx = CallContext::static_call(Address::ZERO, state.timestamp, state.block_number);
        Ok(match state.contracts.get_mut(&to) {
            Some(contract) => contract.call(&ctx, &data),
            None => CallOutcome::success(Vec::new()),
        })
    }

    async fn latest_timestamp(&self) -> Result<UnixSeconds, ChainError> {
        Ok(self.state().timestamp)
    }
}

#[async_trait]
impl LogSource for MockChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.state().block_number)
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<EventLog>, ChainError> {
        Ok(self
            .state()
            .logs
            .iter()
            .filter(|log| log.address == filter.address && filter.contains(log.block_number))
            .cloned()
            .collect())
    }
}
