// libs/availability-cell/tests/availability_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::models::{
    AvailabilityError, PublishAvailabilityRequest, SlotDuration,
};
use availability_cell::services::availability::AvailabilityService;
use shared_utils::test_utils::TestConfig;

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
}

fn publish_request(provider_id: Uuid) -> PublishAvailabilityRequest {
    PublishAvailabilityRequest {
        provider_id,
        date: NaiveDate::from_ymd_opt(2030, 6, 15).unwrap(),
        start_time: time("09:00:00"),
        end_time: time("12:00:00"),
        break_start: Some(time("10:00:00")),
        break_end: Some(time("10:30:00")),
        slot_duration_minutes: SlotDuration::Min30,
    }
}

async fn mount_doctor(server: &MockServer, provider_id: Uuid) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": provider_id,
            "role": "doctor",
            "display_name": "Dr. Reyes"
        })))
        .mount(server)
        .await;
}

fn window_row(request: &PublishAvailabilityRequest) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "provider_id": request.provider_id,
        "date": request.date,
        "start_time": request.start_time.format("%H:%M:%S").to_string(),
        "end_time": request.end_time.format("%H:%M:%S").to_string(),
        "break_start": request.break_start.map(|t| t.format("%H:%M:%S").to_string()),
        "break_end": request.break_end.map(|t| t.format("%H:%M:%S").to_string()),
        "slot_duration_minutes": 30,
        "created_at": Utc::now().to_rfc3339(),
    })
}

#[tokio::test]
async fn doctor_publishes_a_valid_window() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let provider_id = Uuid::new_v4();
    let request = publish_request(provider_id);

    mount_doctor(&server, provider_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_windows"))
        .and(body_partial_json(json!({
            "provider_id": provider_id,
            "start_time": "09:00:00",
            "slot_duration_minutes": 30,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([window_row(&request)])))
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&config);
    let window = service
        .publish_availability(request, "test-token")
        .await
        .expect("publish should succeed");

    assert_eq!(window.provider_id, provider_id);
    assert_eq!(window.slot_duration_minutes, SlotDuration::Min30);
}

#[tokio::test]
async fn non_doctor_cannot_publish() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let provider_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": provider_id,
            "role": "patient",
            "display_name": "Alex Chen"
        })))
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&config);
    let result = service
        .publish_availability(publish_request(provider_id), "test-token")
        .await;

    assert_matches!(result, Err(AvailabilityError::NotADoctor));
}

#[tokio::test]
async fn invalid_window_never_reaches_the_store() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let mut request = publish_request(Uuid::new_v4());
    request.break_end = None; // break_start without break_end

    let service = AvailabilityService::new(&config);
    let result = service.publish_availability(request, "test-token").await;

    assert_matches!(result, Err(AvailabilityError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn open_slots_exclude_booked_times() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let provider_id = Uuid::new_v4();
    let request = publish_request(provider_id);
    let date = request.date;

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .and(query_param("date", format!("eq.{}", date)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([window_row(&request)])))
        .mount(&server)
        .await;

    // 09:30 is already held by an active appointment.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(pending,approved)"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "time": "09:30:00" }])),
        )
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&config);
    let slots = service
        .list_open_slots(provider_id, date, "test-token")
        .await
        .expect("slots should load");

    let expected: Vec<NaiveTime> = ["09:00:00", "10:30:00", "11:00:00", "11:30:00"]
        .iter()
        .map(|s| time(s))
        .collect();
    assert_eq!(slots, expected);
}

#[tokio::test]
async fn no_windows_means_no_slots_and_no_booking_lookup() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let provider_id = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2030, 6, 16).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&config);
    let slots = service
        .list_open_slots(provider_id, date, "test-token")
        .await
        .expect("empty slot list");

    assert!(slots.is_empty());
    // Only the window query went out.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn store_timeout_is_surfaced_as_unavailable() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    let provider_id = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2030, 6, 15).unwrap();

    // Longer than the configured client timeout.
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&config);
    let result = service.list_windows(provider_id, date, "test-token").await;

    assert_matches!(result, Err(AvailabilityError::StoreUnavailable(_)));
}
