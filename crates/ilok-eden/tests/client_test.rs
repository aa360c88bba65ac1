//! Contract tests for EdenClient against a wiremock server.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST | `/api/v1/licenses/deposit` | `deposit_*` |
//! | POST | `/api/v1/licenses/refresh` | `refresh_*` |

use ilok_eden::{EdenClient, EdenConfig, EdenError, LicenseService};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build an EdenClient pointed at a wiremock server.
fn test_client(mock_server: &MockServer) -> EdenClient {
    let config = EdenConfig {
        base_url: mock_server.uri(),
        api_token: "test-token".into(),
        timeout_secs: 5,
    };
    EdenClient::new(config).unwrap()
}

// ── POST /api/v1/licenses/deposit ────────────────────────────────────

#[tokio::test]
async fn deposit_sends_expected_payload_and_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/licenses/deposit"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({
            "skuGuids": ["sku-guid-0001", "sku-guid-0001", "sku-guid-0002"],
            "accountId": "ilokuser42",
            "orderId": 77
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "licenses": [
                {"licenseGuid": "lic-1"},
                {"licenseGuid": "lic-2"},
                {"licenseGuid": "lic-3"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let skus = vec![
        "sku-guid-0001".to_string(),
        "sku-guid-0001".to_string(),
        "sku-guid-0002".to_string(),
    ];
    let response = client.deposit_skus(&skus, "ilokuser42", 77).await.unwrap();

    assert!(response.is_success());
    assert_eq!(
        response.license_guids().unwrap(),
        vec!["lic-1", "lic-2", "lic-3"]
    );
}

#[tokio::test]
async fn deposit_rejection_is_an_envelope_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/licenses/deposit"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"error":"unknown sku"}"#),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client
        .deposit_skus(&["nope".to_string()], "acct", 1)
        .await
        .unwrap();

    assert_eq!(response.httpcode, 422);
    assert!(!response.is_success());
    assert_eq!(response.body, r#"{"error":"unknown sku"}"#);
}

#[tokio::test]
async fn deposit_server_error_is_an_envelope_too() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/licenses/deposit"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client
        .deposit_skus(&["sku-guid-0001".to_string()], "acct", 2)
        .await
        .unwrap();

    assert_eq!(response.httpcode, 500);
    assert!(!response.is_success());
}

// ── POST /api/v1/licenses/refresh ────────────────────────────────────

#[tokio::test]
async fn refresh_sends_null_account_when_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/licenses/refresh"))
        .and(body_json(serde_json::json!({
            "depositReference": "dep-ref-1",
            "accountId": null
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":"refreshed"}"#),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client.refresh_subscription(None, "dep-ref-1").await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn refresh_sends_account_when_present() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/licenses/refresh"))
        .and(body_json(serde_json::json!({
            "depositReference": "dep-ref-2",
            "accountId": "ilokuser42"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":"refreshed"}"#),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client
        .refresh_subscription(Some("ilokuser42"), "dep-ref-2")
        .await
        .unwrap();
    assert!(response.is_success());
}

// ── Transport failures ───────────────────────────────────────────────

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Nothing listens here.
    let config = EdenConfig {
        base_url: "http://127.0.0.1:19013".into(),
        api_token: "test-token".into(),
        timeout_secs: 5,
    };
    let client = EdenClient::new(config).unwrap();

    let result = client
        .deposit_skus(&["sku-guid-0001".to_string()], "acct", 3)
        .await;
    assert!(matches!(result, Err(EdenError::Transport(_))));
}
