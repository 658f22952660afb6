// libs/shared/database/tests/store_test.rs
use assert_matches::assert_matches;
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::store::{RecordStoreClient, StoreError};

fn config(url: &str) -> AppConfig {
    AppConfig {
        record_store_url: url.to_string(),
        record_store_api_key: "test-api-key".to_string(),
        jwt_secret: "unused".to_string(),
        directory_service_url: url.to_string(),
        session_provider_url: url.to_string(),
        session_provider_api_token: "unused".to_string(),
        store_timeout_secs: 1,
    }
}

#[tokio::test]
async fn requests_carry_api_key_and_bearer_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/things"))
        .and(header("apikey", "test-api-key"))
        .and(header("Authorization", "Bearer caller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RecordStoreClient::new(&config(&server.uri()));
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/things", Some("caller-token"), None)
        .await
        .expect("request should succeed");

    assert!(rows.is_empty());
}

#[tokio::test]
async fn insert_conflict_is_distinguished_from_other_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/things"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&server)
        .await;

    let client = RecordStoreClient::new(&config(&server.uri()));
    let result = client
        .insert_returning("/rest/v1/things", Some("t"), json!({"id": 1}))
        .await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn insert_returning_asks_for_representation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/things"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RecordStoreClient::new(&config(&server.uri()));
    let rows = client
        .insert_returning("/rest/v1/things", Some("t"), json!({"id": 1}))
        .await
        .expect("insert should succeed");

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn conditional_update_returns_matched_rows_only() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/things"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = RecordStoreClient::new(&config(&server.uri()));
    let rows = client
        .update_where("/rest/v1/things?id=eq.1&state=eq.open", Some("t"), json!({"state": "closed"}))
        .await
        .expect("update should succeed");

    // Empty result is the caller's compare-and-swap failure signal.
    assert!(rows.is_empty());
}

#[tokio::test]
async fn timeout_is_classified_as_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/things"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = RecordStoreClient::new(&config(&server.uri()));
    let result: Result<Vec<Value>, _> = client
        .request(Method::GET, "/rest/v1/things", Some("t"), None)
        .await;

    assert_matches!(result, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn upstream_503_is_classified_as_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/things"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = RecordStoreClient::new(&config(&server.uri()));
    let result: Result<Vec<Value>, _> = client
        .request(Method::GET, "/rest/v1/things", Some("t"), None)
        .await;

    assert_matches!(result, Err(StoreError::Unavailable(_)));
}
