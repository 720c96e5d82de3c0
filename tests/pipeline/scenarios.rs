use std::{sync::Arc, time::Duration};

use alloy::primitives::U256;
use axum::http::StatusCode;
use serde_json::json;

use odos_swap::{
    LedgerClient, OdosApi, ReceiptStatus, Stage, SwapError, SwapIntent, SwapOrchestrator,
    SwapOutcome, SwapState,
};

use crate::common::{
    assembled, fraxtal, receipt, routed_quote, routeless_quote, MockLedger, MockOdos, FROM_TOKEN,
    ONE_TOKEN, ROUTER, SWAP_HASH, TO_TOKEN,
};

fn orchestrator(mock: &MockOdos, ledger: &Arc<MockLedger>) -> SwapOrchestrator {
    let client: Arc<dyn LedgerClient> = ledger.clone();
    SwapOrchestrator::new(OdosApi::new(Some(mock.base_url.clone())), client)
}

fn intent() -> SwapIntent {
    SwapIntent::new(
        fraxtal(),
        FROM_TOKEN,
        TO_TOKEN,
        U256::from_str_radix(ONE_TOKEN, 10).unwrap(),
    )
    .unwrap()
}

fn funded() -> MockLedger {
    MockLedger::new().with_allowance(U256::MAX)
}

#[tokio::test]
async fn no_route_ends_without_touching_the_ledger() {
    let mock = MockOdos::start(
        (StatusCode::OK, routeless_quote()),
        (StatusCode::OK, assembled(0)),
    )
    .await;
    let ledger = Arc::new(funded());

    let outcome = orchestrator(&mock, &ledger).run(&intent()).await;

    assert_eq!(outcome.state(), SwapState::NoRoute);
    assert_eq!(mock.assemble_calls(), 0);
    assert!(ledger.calls().is_empty(), "{:?}", ledger.calls());

    let failure = outcome.into_result().unwrap_err();
    assert_eq!(failure.stage, Stage::Quote);
    assert!(matches!(failure.source, SwapError::NoRouteFound));
}

#[tokio::test]
async fn happy_path_confirms_with_fresh_nonce() {
    let mock = MockOdos::routed().await;
    let ledger = Arc::new(funded());

    let outcome = orchestrator(&mock, &ledger).run(&intent()).await;
    let state = outcome.state();

    let SwapOutcome::Confirmed {
        quote,
        transaction,
        receipt,
    } = outcome
    else {
        panic!("expected confirmed outcome, got {state}");
    };
    assert_eq!(quote.path_id.as_deref(), Some("abc123"));
    assert_eq!(transaction.to, ROUTER);
    assert_eq!(receipt.hash, SWAP_HASH);
    assert_eq!(receipt.gas_cost(), U256::from(21_000u64));

    assert_eq!(mock.last_assemble_request()["pathId"], "abc123");

    // Allowance already covered the amount: no approval.
    assert!(ledger.approvals().is_empty());
    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    // Assembled nonce was 3; the ledger reports 5.
    assert_eq!(sent[0].1, 5);
    assert_eq!(
        ledger.calls(),
        vec!["allowance", "transaction_count", "send_transaction", "wait_for_receipt"]
    );
}

#[tokio::test]
async fn reverted_receipt_is_an_outcome_not_an_error() {
    let mock = MockOdos::routed().await;
    let ledger = Arc::new(MockLedger {
        swap_receipt: Some(receipt(SWAP_HASH, ReceiptStatus::Failed)),
        ..funded()
    });

    let outcome = orchestrator(&mock, &ledger).run(&intent()).await;
    assert_eq!(outcome.state(), SwapState::Reverted);

    let failure = outcome.into_result().unwrap_err();
    assert_eq!(failure.stage, Stage::Confirm);
    assert!(matches!(
        failure.source,
        SwapError::ExecutionReverted { hash, block: 777 } if hash == SWAP_HASH
    ));
    assert!(failure.allowance_in_effect());
}

#[tokio::test]
async fn quote_failure_stops_the_pipeline() {
    let mock = MockOdos::start(
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": "boom" })),
        (StatusCode::OK, assembled(0)),
    )
    .await;
    let ledger = Arc::new(funded());

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Quote);
    assert!(matches!(failure.source, SwapError::QuoteFetch { status: 500, .. }));
    assert!(failure.quote.is_none());
    assert_eq!(mock.assemble_calls(), 0);
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn expired_path_is_reported_at_assembly() {
    let mock = MockOdos::start(
        (StatusCode::OK, routed_quote("stale")),
        (
            StatusCode::BAD_REQUEST,
            json!({ "detail": "Path ID not found or expired" }),
        ),
    )
    .await;
    let ledger = Arc::new(funded());

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Assemble);
    assert!(matches!(
        failure.source,
        SwapError::QuoteExpired { ref path_id } if path_id == "stale"
    ));
    assert!(failure.quote.is_some());
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn rejected_submission_leaves_allowance_in_effect() {
    let mock = MockOdos::routed().await;
    let ledger = Arc::new(MockLedger {
        reject_submission: true,
        ..MockLedger::new()
    });

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Submit);
    assert!(matches!(failure.source, SwapError::Submission(_)));
    assert!(failure.hash.is_none());
    assert!(failure.allowance_in_effect());
    assert!(failure
        .to_string()
        .contains("router allowance granted for this swap remains in effect"));
    // The approval went through before submission failed.
    assert_eq!(ledger.approvals().len(), 1);
}

#[tokio::test]
async fn confirmation_timeout_keeps_the_hash() {
    let mock = MockOdos::routed().await;
    let ledger = Arc::new(MockLedger {
        swap_receipt: None,
        ..funded()
    });

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Confirm);
    assert!(matches!(
        failure.source,
        SwapError::ConfirmationTimeout { hash } if hash == SWAP_HASH
    ));
    assert_eq!(failure.hash, Some(SWAP_HASH));
    assert!(failure.to_string().contains(&SWAP_HASH.to_string()));
}

#[tokio::test]
async fn slow_quote_hits_the_stage_deadline() {
    let mock = MockOdos::routed().await;
    mock.delay_quotes(Duration::from_millis(500));
    let ledger = Arc::new(funded());

    let outcome = orchestrator(&mock, &ledger)
        .with_stage_timeout(Some(Duration::from_millis(50)))
        .run(&intent())
        .await;

    let SwapOutcome::Failed(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Quote);
    assert!(matches!(
        failure.source,
        SwapError::StageTimeout {
            stage: Stage::Quote
        }
    ));
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn quote_for_another_input_token_is_refused() {
    let mut body = routed_quote("abc123");
    body["inTokens"] = json!([crate::common::hex(TO_TOKEN)]);
    body["outTokens"] = json!([crate::common::hex(FROM_TOKEN)]);
    let mock = MockOdos::start((StatusCode::OK, body), (StatusCode::OK, assembled(0))).await;
    let ledger = Arc::new(funded());

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Allowance);
    assert!(matches!(failure.source, SwapError::Validation(_)));
    assert!(!failure.allowance_in_effect());
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn assembly_for_another_chain_is_not_sent() {
    let mut body = assembled(3);
    body["transaction"]["chainId"] = json!(8453);
    let mock = MockOdos::start((StatusCode::OK, routed_quote("abc123")), (StatusCode::OK, body)).await;
    let ledger = Arc::new(funded());

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Submit);
    assert!(matches!(failure.source, SwapError::Validation(_)));
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn reverted_approval_stops_before_submission() {
    let mock = MockOdos::routed().await;
    let ledger = Arc::new(MockLedger {
        approval_succeeds: false,
        ..MockLedger::new()
    });

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Allowance);
    assert!(matches!(failure.source, SwapError::Allowance(_)));
    assert!(!failure.allowance_in_effect());
    assert_eq!(
        ledger.approvals(),
        vec![(FROM_TOKEN, ROUTER, U256::from_str_radix(ONE_TOKEN, 10).unwrap())]
    );
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn unconfirmed_approval_stops_before_submission() {
    let mock = MockOdos::routed().await;
    let ledger = Arc::new(MockLedger {
        approval_receipt_times_out: true,
        ..MockLedger::new()
    });

    let SwapOutcome::Failed(failure) = orchestrator(&mock, &ledger).run(&intent()).await else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage, Stage::Allowance);
    assert!(matches!(failure.source, SwapError::Allowance(_)));
    assert!(failure.source.to_string().contains("not confirmed"), "{}", failure.source);
    assert!(!failure.allowance_in_effect());
    assert_eq!(failure.hash, None);
    assert!(ledger.sent().is_empty());
    assert!(!ledger.calls().contains(&"transaction_count"));
}
