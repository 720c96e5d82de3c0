use std::sync::Arc;

use alloy::primitives::U256;
use axum::http::StatusCode;
use serde_json::json;

use odos_swap::{
    ChainRegistry, LedgerClient, OdosApi, QuoteService, SwapError, SwapIntent,
};

use crate::common::{
    assembled, fraxtal, hex, routed_quote, routeless_quote, MockLedger, MockOdos, FROM_TOKEN,
    ONE_TOKEN, SIGNER, TO_TOKEN,
};

fn service(mock: &MockOdos, ledger: MockLedger) -> QuoteService {
    let ledger: Arc<dyn LedgerClient> = Arc::new(ledger);
    QuoteService::new(OdosApi::new(Some(mock.base_url.clone())), ledger)
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

#[tokio::test]
async fn sends_fixed_routing_parameters() {
    let mock = MockOdos::routed().await;
    let quote = service(&mock, MockLedger::new())
        .get_quote(&intent())
        .await
        .unwrap();

    assert_eq!(quote.path_id.as_deref(), Some("abc123"));
    assert_eq!(quote.in_tokens, vec![FROM_TOKEN]);
    assert_eq!(quote.out_amounts, vec!["2500500000".to_string()]);
    assert_eq!(quote.price_impact_percent, Some(0.02));

    let body = mock.last_quote_request();
    assert_eq!(body["chainId"], 252);
    assert_eq!(
        body["userAddr"].as_str().unwrap().to_lowercase(),
        hex(SIGNER)
    );
    assert_eq!(
        body["inputTokens"][0]["tokenAddress"]
            .as_str()
            .unwrap()
            .to_lowercase(),
        hex(FROM_TOKEN)
    );
    assert_eq!(body["inputTokens"][0]["amount"], ONE_TOKEN);
    assert_eq!(
        body["outputTokens"][0]["tokenAddress"]
            .as_str()
            .unwrap()
            .to_lowercase(),
        hex(TO_TOKEN)
    );
    assert_eq!(body["outputTokens"][0]["proportion"], 1.0);
    assert_eq!(body["slippageLimitPercent"], 0.3);
    assert_eq!(body["referralCode"], 0);
    assert_eq!(body["disableRFQs"], true);
    assert_eq!(body["compact"], true);
}

#[tokio::test]
async fn missing_path_id_is_a_routeless_quote() {
    let mock = MockOdos::start(
        (StatusCode::OK, routeless_quote()),
        (StatusCode::OK, assembled(0)),
    )
    .await;
    let quote = service(&mock, MockLedger::new())
        .get_quote(&intent())
        .await
        .unwrap();

    assert!(!quote.has_route());
    assert_eq!(quote.price_impact_percent, None);
    assert_eq!(mock.assemble_calls(), 0);
}

#[tokio::test]
async fn non_success_status_carries_code_and_body() {
    let mock = MockOdos::start(
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "router overloaded" }),
        ),
        (StatusCode::OK, assembled(0)),
    )
    .await;
    let err = service(&mock, MockLedger::new())
        .get_quote(&intent())
        .await
        .unwrap_err();

    match err {
        SwapError::QuoteFetch { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("router overloaded"), "{message}");
        }
        other => panic!("expected QuoteFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_signer_fails_before_any_request() {
    let mock = MockOdos::routed().await;
    let ledger = MockLedger {
        signer: None,
        ..MockLedger::new()
    };
    let err = service(&mock, ledger).get_quote(&intent()).await.unwrap_err();

    assert!(matches!(err, SwapError::MissingSigner));
    assert_eq!(mock.quote_calls(), 0);
}

#[tokio::test]
async fn chain_mismatch_fails_before_any_request() {
    let mock = MockOdos::routed().await;
    let registry = ChainRegistry::builtin().unwrap();
    let base = registry.resolve("base").unwrap().clone();
    let intent = SwapIntent::new(base, FROM_TOKEN, TO_TOKEN, U256::from(1u64)).unwrap();

    let err = service(&mock, MockLedger::new())
        .get_quote(&intent)
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::Validation(_)));
    assert_eq!(mock.quote_calls(), 0);
}

#[tokio::test]
async fn mismatched_leg_arrays_are_rejected() {
    let mut body = routed_quote("abc123");
    body["inAmounts"] = json!([ONE_TOKEN, "5"]);
    let mock = MockOdos::start((StatusCode::OK, body), (StatusCode::OK, assembled(0))).await;

    let err = service(&mock, MockLedger::new())
        .get_quote(&intent())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Serialization(_)));
}

#[tokio::test]
async fn formats_legs_with_their_own_decimals() {
    let mock = MockOdos::routed().await;
    let service = service(&mock, MockLedger::new());
    let quote = service.get_quote(&intent()).await.unwrap();
    let text = service.format(&quote).await.unwrap();

    assert!(text.starts_with("💱 Quote Details"));
    assert!(text.contains("- Input: 1 "), "{text}");
    assert!(text.contains("- Output: 2500.5 "), "{text}");
    assert!(text.contains("- Price Impact: 0.02%"), "{text}");
    assert!(text.contains("- Gas Estimate: 182000 (0.42 USD)"), "{text}");
    assert!(text.contains("- Net Output Value: $2500.10"), "{text}");
}
