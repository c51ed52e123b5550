//! Off-chain audits against the in-memory ledger.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use nfa1_audit::{OffchainAuditor, OffchainReport};
use nfa1_core::bindings::INFA1;
use nfa1_core::{
    AgentEventKind, AuditError, CallOutcome, ChainError, Confidence, EventLog, LogFilter,
    QuickCheck, UnixSeconds, Verdict,
};
use nfa1_test_utils::fixtures::{self, AGENT_OWNER, EOA_ADDRESS, STORE_ADDRESS, UNRELATED_ADDRESS};
use nfa1_test_utils::{MockChain, VerifierConfig};
use nfa1_verifier::{ChainReader, LogSource};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const WINDOW: u64 = 100;

fn auditor(chain: &Arc<MockChain>, window: u64) -> OffchainAuditor<Arc<MockChain>> {
    let config = VerifierConfig::default().with_call_timeout(Duration::from_secs(5));
    OffchainAuditor::new(chain.clone(), config, window).unwrap()
}

fn deployed(address: Address, contract: impl nfa1_test_utils::Contract + 'static) -> Arc<MockChain> {
    let chain = Arc::new(MockChain::new());
    chain.deploy(address, contract);
    chain
}

fn execute_action(chain: &MockChain) {
    let input = INFA1::executeActionCall {
        tokenId: U256::from(1u64),
        data: Bytes::from_static(b"ping"),
    }
    .abi_encode();
    assert!(chain.transact(AGENT_OWNER, STORE_ADDRESS, &input, U256::ZERO).is_success());
}

#[tokio::test]
async fn test_freshly_minted_store_is_high_confidence() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    let out = auditor(&chain, WINDOW).run(STORE_ADDRESS).await.unwrap();

    assert_eq!(out.report.verdict, Verdict::Tier3);
    assert_eq!(out.quick, QuickCheck::likely(3));
    assert_eq!(out.events.count(AgentEventKind::AgentCreated), 1);
    assert_eq!(out.events.count(AgentEventKind::Transfer), 1);
    assert_eq!(out.events.unknown, 0);
    assert_eq!(out.confidence, Confidence::High);
}

#[tokio::test]
async fn test_quiet_store_is_medium_confidence() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    chain.advance_blocks(WINDOW + 10);

    let out = auditor(&chain, WINDOW).run(STORE_ADDRESS).await.unwrap();
    assert_eq!(out.report.verdict, Verdict::Tier3);
    assert_eq!(out.events.total, 0);
    assert_eq!(out.confidence, Confidence::Medium);
}

#[tokio::test]
async fn test_recent_action_restores_high_confidence() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    chain.advance_blocks(WINDOW + 10);
    execute_action(&chain);

    let out = auditor(&chain, WINDOW).run(STORE_ADDRESS).await.unwrap();
    assert_eq!(out.events.count(AgentEventKind::ActionExecuted), 1);
    assert_eq!(out.events.to_block, chain.current_block());
    assert_eq!(out.confidence, Confidence::High);
}

#[tokio::test]
async fn test_events_alone_are_low_confidence() {
    let chain = deployed(STORE_ADDRESS, fixtures::undeclared_store());
    let out = auditor(&chain, WINDOW).run(STORE_ADDRESS).await.unwrap();

    assert_eq!(out.report.verdict, Verdict::NotNfa1);
    assert!(out.events.has_agent_activity());
    assert_eq!(out.quick, QuickCheck::NEGATIVE);
    assert_eq!(out.confidence, Confidence::Low);
}

#[tokio::test]
async fn test_unrelated_contract_is_no_confidence() {
    let chain = deployed(UNRELATED_ADDRESS, fixtures::unrelated_contract());
    let out = auditor(&chain, WINDOW).run(UNRELATED_ADDRESS).await.unwrap();

    assert_eq!(out.report.verdict, Verdict::NotNfa1);
    assert_eq!(out.confidence, Confidence::None);
}

#[tokio::test]
async fn test_address_without_code() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    let out = auditor(&chain, WINDOW).run(EOA_ADDRESS).await.unwrap();

    assert!(!out.report.is_contract);
    assert_eq!(out.report.verdict, Verdict::NotContract);
    assert_eq!(out.quick, QuickCheck::NEGATIVE);
    assert_eq!(out.events.total, 0);
    assert_eq!(out.confidence, Confidence::None);
    assert!(chain.static_calls().is_empty());
}

#[tokio::test]
async fn test_document_shape() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    let out = auditor(&chain, WINDOW).run(STORE_ADDRESS).await.unwrap();

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["confidence"], "HIGH");
    assert_eq!(json["report"]["verdict"], "TIER3");
    assert_eq!(json["quick"]["confidence"], "LOW");
    assert_eq!(json["events"]["by_kind"]["AgentCreated"], 1);
    assert!(json["limitations"].as_array().unwrap().len() >= 4);

    let back: OffchainReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, out);
}

/// Ledger whose node answers calls but fails every log query.
struct FailingLogs {
    inner: Arc<MockChain>,
    error: ChainError,
}

#[async_trait]
impl ChainReader for FailingLogs {
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        self.inner.code_at(address).await
    }

    async fn static_call(&self, to: Address, data: Bytes) -> Result<CallOutcome, ChainError> {
        self.inner.static_call(to, data).await
    }

    async fn latest_timestamp(&self) -> Result<UnixSeconds, ChainError> {
        self.inner.latest_timestamp().await
    }
}

#[async_trait]
impl LogSource for FailingLogs {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.inner.block_number().await
    }

    async fn logs(&self, _filter: &LogFilter) -> Result<Vec<EventLog>, ChainError> {
        Err(self.error.clone())
    }
}

fn failing_logs(chain: &Arc<MockChain>, error: ChainError) -> OffchainAuditor<FailingLogs> {
    let config = VerifierConfig::default().with_call_timeout(Duration::from_secs(5));
    let ledger = FailingLogs {
        inner: chain.clone(),
        error,
    };
    OffchainAuditor::new(ledger, config, WINDOW).unwrap()
}

#[tokio::test]
async fn test_refused_log_scan_keeps_report() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    let refused = ChainError::Rpc {
        code: -32005,
        message: "query returned more than 10000 results".to_string(),
    };
    let out = failing_logs(&chain, refused).run(STORE_ADDRESS).await.unwrap();

    assert_eq!(out.report.verdict, Verdict::Tier3);
    assert_eq!(out.quick, QuickCheck::likely(3));
    assert!(out.events.unavailable);
    assert_eq!(out.events.total, 0);
    assert_eq!(out.events.to_block, chain.current_block());
    assert_eq!(out.confidence, Confidence::Medium);

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["events"]["unavailable"], true);
}

#[tokio::test]
async fn test_log_scan_timeout_fails_audit() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    let timeout = ChainError::Timeout {
        method: "eth_getLogs".to_string(),
        elapsed_ms: 30_000,
    };
    let err = failing_logs(&chain, timeout).run(STORE_ADDRESS).await.unwrap_err();
    assert!(matches!(err, AuditError::Chain(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_quick_mode() {
    let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
    let quick = auditor(&chain, WINDOW).quick(STORE_ADDRESS).await.unwrap();
    assert_eq!(quick.target, STORE_ADDRESS);
    assert_eq!(quick.quick.tier, 3);
}

#[test]
fn test_invalid_verifier_config_rejected() {
    let chain = Arc::new(MockChain::new());
    let config = VerifierConfig {
        placeholder_base: 0,
        ..VerifierConfig::default()
    };
    assert!(OffchainAuditor::new(chain, config, WINDOW).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_window_counts_only_recent_blocks(advance in 0u64..60, window in 1u64..40) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let chain = deployed(STORE_ADDRESS, fixtures::conformant_store());
        chain.advance_blocks(advance);

        let events = runtime
            .block_on(auditor(&chain, window).scan_events(STORE_ADDRESS))
            .unwrap();
        // The mint landed in block 1 and the head is 1 + advance. The window
        // may reach back to block 0.
        let mint_visible = advance < window;
        prop_assert_eq!(events.count(AgentEventKind::AgentCreated), u64::from(mint_visible));
        prop_assert_eq!(events.to_block, 1 + advance);
        prop_assert_eq!(events.to_block - events.from_block + 1, window.min(2 + advance));
    }
}
