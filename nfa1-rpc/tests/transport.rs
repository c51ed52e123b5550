//! RpcClient against a wiremock JSON-RPC node.

use alloy_primitives::{Address, Bytes};
use nfa1_core::{CallOutcome, ChainError, LogFilter, Verdict};
use nfa1_rpc::RpcClient;
use nfa1_store::{CallContext, Contract};
use nfa1_test_utils::fixtures;
use nfa1_verifier::{ChainReader, LogSource, Verifier};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const TARGET: Address = Address::with_last_byte(0x51);

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_error(error: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "error": error}))
}

async fn mock_method(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> RpcClient {
    RpcClient::new(server.uri()).unwrap()
}

#[tokio::test]
async fn test_get_code() {
    let server = MockServer::start().await;
    mock_method(&server, "eth_getCode", rpc_result(json!("0x6080"))).await;

    let code = client(&server).code_at(TARGET).await.unwrap();
    assert_eq!(code, Bytes::from(vec![0x60, 0x80]));
}

#[tokio::test]
async fn test_call_success() {
    let server = MockServer::start().await;
    mock_method(&server, "eth_call", rpc_result(json!(format!("0x{}", "00".repeat(31) + "01")))).await;

    let outcome = client(&server).static_call(TARGET, Bytes::from(vec![1, 2, 3, 4])).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.data().len(), 32);
}

#[tokio::test]
async fn test_call_revert_with_data() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "eth_call",
        rpc_error(json!({"code": 3, "message": "execution reverted: NFA: nope", "data": "0x08c379a0"})),
    )
    .await;

    let outcome = client(&server).static_call(TARGET, Bytes::new()).await.unwrap();
    assert_eq!(outcome, CallOutcome::revert(vec![0x08, 0xc3, 0x79, 0xa0]));
}

#[tokio::test]
async fn test_call_revert_without_data() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "eth_call",
        rpc_error(json!({"code": -32000, "message": "execution reverted"})),
    )
    .await;

    let outcome = client(&server).static_call(TARGET, Bytes::new()).await.unwrap();
    assert_eq!(outcome, CallOutcome::empty_revert());
}

#[tokio::test]
async fn test_call_invalid_opcode_is_empty_revert() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "eth_call",
        rpc_error(json!({"code": -32000, "message": "invalid opcode: INVALID"})),
    )
    .await;

    let outcome = client(&server).static_call(TARGET, Bytes::new()).await.unwrap();
    assert_eq!(outcome, CallOutcome::empty_revert());
}

#[tokio::test]
async fn test_rejected_call_is_rpc_error() {
    let server = MockServer::start().await;
    mock_method(&server, "eth_call", rpc_error(json!({"code": -32602, "message": "invalid params"}))).await;

    let err = client(&server).static_call(TARGET, Bytes::new()).await.unwrap_err();
    assert!(matches!(err, ChainError::Rpc { code: -32602, .. }));
}

#[tokio::test]
async fn test_rejected_request_is_rpc_error() {
    let server = MockServer::start().await;
    mock_method(&server, "eth_getCode", rpc_error(json!({"code": -32602, "message": "invalid params"}))).await;

    let err = client(&server).code_at(TARGET).await.unwrap_err();
    assert_eq!(
        err,
        ChainError::Rpc {
            code: -32602,
            message: "invalid params".to_string()
        }
    );
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server).code_at(TARGET).await.unwrap_err();
    assert!(matches!(err, ChainError::Transport { ref reason, .. } if reason.contains("503")));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = RpcClient::with_timeout("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = client.code_at(TARGET).await.unwrap_err();
    assert!(matches!(err, ChainError::Transport { .. }));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_slow_node_is_timeout() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "eth_call",
        rpc_result(json!("0x")).set_delay(Duration::from_secs(5)),
    )
    .await;

    let client = RpcClient::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();
    let err = client.static_call(TARGET, Bytes::new()).await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[tokio::test]
async fn test_malformed_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).code_at(TARGET).await.unwrap_err();
    assert!(matches!(err, ChainError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_latest_timestamp_and_block_number() {
    let server = MockServer::start().await;
    mock_method(&server, "eth_getBlockByNumber", rpc_result(json!({"number": "0x10", "timestamp": "0x6553f100"}))).await;
    mock_method(&server, "eth_blockNumber", rpc_result(json!("0x10"))).await;

    let client = client(&server);
    assert_eq!(client.latest_timestamp().await.unwrap(), 0x6553f100);
    assert_eq!(client.block_number().await.unwrap(), 16);
}

#[tokio::test]
async fn test_get_logs_skips_pending() {
    let server = MockServer::start().await;
    let topic = format!("0x{}", "ab".repeat(32));
    mock_method(
        &server,
        "eth_getLogs",
        rpc_result(json!([
            {"address": format!("{TARGET:#x}"), "topics": [topic], "data": "0x", "blockNumber": "0x5"},
            {"address": format!("{TARGET:#x}"), "topics": [topic], "data": "0x", "blockNumber": null}
        ])),
    )
    .await;

    let filter = LogFilter::recent(TARGET, 10, 10);
    let logs = client(&server).logs(&filter).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].block_number, 5);
    assert_eq!(logs[0].address, TARGET);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["params"][0]["fromBlock"], "0x1");
    assert_eq!(body["params"][0]["toBlock"], "0xa");
}

// ============================================================================
// END TO END
// ============================================================================

/// Serves a contract as a JSON-RPC node would.
struct ContractNode {
    contract: Mutex<Box<dyn Contract>>,
}

impl ContractNode {
    fn new(contract: impl Contract + 'static) -> Self {
        Self {
            contract: Mutex::new(Box::new(contract)),
        }
    }
}

impl Respond for ContractNode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let mut contract = self.contract.lock().unwrap();
        match body["method"].as_str().unwrap() {
            "eth_getCode" => rpc_result(json!(format!("0x{}", hex::encode(contract.code())))),
            "eth_getBlockByNumber" => rpc_result(json!({"timestamp": "0x64"})),
            "eth_call" => {
                let data = body["params"][0]["data"].as_str().unwrap();
                let input = hex::decode(data.trim_start_matches("0x")).unwrap();
                let ctx = CallContext::static_call(Address::ZERO, 100, 1);
                match contract.call(&ctx, &input) {
                    CallOutcome::Success(out) => rpc_result(json!(format!("0x{}", hex::encode(out)))),
                    CallOutcome::Revert(out) if out.is_empty() => {
                        rpc_error(json!({"code": -32000, "message": "execution reverted"}))
                    }
                    CallOutcome::Revert(out) => rpc_error(json!({
                        "code": 3,
                        "message": "execution reverted",
                        "data": format!("0x{}", hex::encode(out)),
                    })),
                }
            }
            other => rpc_error(json!({"code": -32601, "message": format!("method {other} not found")})),
        }
    }
}

#[tokio::test]
async fn test_full_audit_over_json_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ContractNode::new(fixtures::conformant_store()))
        .mount(&server)
        .await;

    let verifier = Verifier::new(client(&server));
    let report = verifier.full_audit(TARGET).await.unwrap();
    assert_eq!(report.verdict, Verdict::Tier3);
    assert_eq!(report.audited_at.timestamp(), 100);
    assert_eq!(report.tier1.passed, report.tier1.total);
}

#[tokio::test]
async fn test_full_audit_of_contract_without_dispatcher() {
    let server = MockServer::start().await;
    mock_method(&server, "eth_getCode", rpc_result(json!("0x6080"))).await;
    mock_method(&server, "eth_getBlockByNumber", rpc_result(json!({"timestamp": "0x64"}))).await;
    mock_method(
        &server,
        "eth_call",
        rpc_error(json!({"code": -32000, "message": "invalid opcode: INVALID"})),
    )
    .await;

    let report = Verifier::new(client(&server)).full_audit(TARGET).await.unwrap();
    assert!(report.is_contract);
    assert_eq!(report.verdict, Verdict::NotNfa1);
    assert_eq!(report.tier1.passed, 0);
    assert!(report.probes.iter().all(|p| p.outcome != nfa1_core::ProbeOutcome::ExistsConfirmed));
}

#[tokio::test]
async fn test_quick_check_over_json_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ContractNode::new(fixtures::unrelated_contract()))
        .mount(&server)
        .await;

    let quick = Verifier::new(client(&server)).quick_check(TARGET).await.unwrap();
    assert!(!quick.is_likely_compliant);
    assert_eq!(quick.tier, 0);
}
