// libs/appointment-cell/tests/lifecycle_test.rs
use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentStatus, SchedulingError};
use appointment_cell::services::lifecycle::LifecycleService;
use shared_utils::test_utils::TestConfig;

fn appointment_row(id: Uuid, provider_id: Uuid, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "provider_id": provider_id,
        "seeker_id": Uuid::new_v4(),
        "date": "2030-06-15",
        "time": "09:30:00",
        "reason": "follow-up",
        "status": status,
        "room_id": format!("room-{}", id),
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339(),
    })
}

async fn mount_fetch(server: &MockServer, row: &serde_json::Value, id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn provider_accepts_pending_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let pending = appointment_row(id, provider_id, "pending");
    mount_fetch(&server, &pending, id).await;

    let mut approved = pending.clone();
    approved["status"] = json!("approved");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([approved])))
        .mount(&server)
        .await;

    let service = LifecycleService::new(&config);
    let result = service
        .accept(id, &provider_id, "test-token")
        .await
        .expect("accept should succeed");

    assert_eq!(result.status, AppointmentStatus::Approved);
}

#[tokio::test]
async fn provider_rejects_pending_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let pending = appointment_row(id, provider_id, "pending");
    mount_fetch(&server, &pending, id).await;

    let mut rejected = pending.clone();
    rejected["status"] = json!("rejected");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([rejected])))
        .mount(&server)
        .await;

    let service = LifecycleService::new(&config);
    let result = service
        .reject(id, &provider_id, "test-token")
        .await
        .expect("reject should succeed");

    assert_eq!(result.status, AppointmentStatus::Rejected);
}

#[tokio::test]
async fn deciding_an_already_decided_appointment_is_invalid() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let approved = appointment_row(id, provider_id, "approved");
    mount_fetch(&server, &approved, id).await;

    let service = LifecycleService::new(&config);
    let result = service.accept(id, &provider_id, "test-token").await;

    assert_matches!(result, Err(SchedulingError::InvalidTransition));
}

#[tokio::test]
async fn losing_the_decision_race_is_invalid_transition() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let pending = appointment_row(id, provider_id, "pending");
    mount_fetch(&server, &pending, id).await;

    // The conditional update matches nothing: another decision landed first.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = LifecycleService::new(&config);
    let result = service.accept(id, &provider_id, "test-token").await;

    assert_matches!(result, Err(SchedulingError::InvalidTransition));
}

#[tokio::test]
async fn only_the_appointment_provider_may_decide() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let pending = appointment_row(id, provider_id, "pending");
    mount_fetch(&server, &pending, id).await;

    let stranger = Uuid::new_v4();
    let service = LifecycleService::new(&config);
    let result = service.accept(id, &stranger, "test-token").await;

    assert_matches!(result, Err(SchedulingError::NotAuthorized));
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = LifecycleService::new(&config);
    let result = service.accept(id, &Uuid::new_v4(), "test-token").await;

    assert_matches!(result, Err(SchedulingError::NotFound));
}
