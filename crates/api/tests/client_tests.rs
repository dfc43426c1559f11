//! Integration tests for the REST client against a mock HR API.

use hrdesk_api::{ApiClientConfig, ApiError, HrApiClient};
use hrdesk_core::events::Feed;
use hrdesk_core::leave::LeaveStatus;
use hrdesk_core::records::RecordKey;
use hrdesk_core::session::{AuthState, CredentialStore, InMemoryCredentialStore, Session};
use hrdesk_core::store::{MergeStore, PullParams, RecordSource, StatusChange};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in(token: &str) -> (Arc<InMemoryCredentialStore>, Arc<Session>) {
    let store = Arc::new(InMemoryCredentialStore::with_token(token));
    let session = Arc::new(Session::restore(store.clone()).unwrap());
    (store, session)
}

fn client_for(server: &MockServer, session: Arc<Session>) -> HrApiClient {
    let config = ApiClientConfig::new(format!("{}/api", server.uri()));
    HrApiClient::new(config, session).unwrap()
}

#[tokio::test]
async fn lists_leave_requests_with_bearer_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leave-requests"))
        .and(header("authorization", "Bearer tok-1"))
        .and(query_param("status", "Pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "reference_no": "LR-1", "status": "Pending" },
                { "reference_no": "LR-2", "status": "Approved" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok-1");
    let client = client_for(&server, session);

    let records = client
        .list_records(Feed::Leave, &PullParams::new().with("status", "Pending"))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get_str("reference_no"), Some("LR-1"));
}

#[tokio::test]
async fn lists_attendance_logs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attendance/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 7, "attendance": [{ "id": 1 }] }]
        })))
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let client = client_for(&server, session);

    let records = client
        .fetch(Feed::Attendance, &PullParams::new())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn unauthorized_response_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leave-requests"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .mount(&server)
        .await;

    let (store, session) = signed_in("stale");
    let mut auth = session.subscribe();
    let client = client_for(&server, session.clone());

    let err = client
        .list_records(Feed::Leave, &PullParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(session.token().is_none());
    assert!(store.load().unwrap().is_none());
    auth.changed().await.unwrap();
    assert_eq!(*auth.borrow(), AuthState::SignedOut);
}

#[tokio::test]
async fn missing_token_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = Arc::new(Session::restore(Arc::new(InMemoryCredentialStore::new())).unwrap());
    let client = client_for(&server, session);

    let err = client
        .fetch(Feed::Leave, &PullParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, hrdesk_core::Error::Unauthorized));
}

#[tokio::test]
async fn failure_message_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/leave-requests/LR-9/approve"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "message": "Leave balance is insufficient" })),
        )
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let client = client_for(&server, session);
    let change = StatusChange::new(LeaveStatus::Approved, "manager@example.com");

    let err = client
        .update_status(Feed::Leave, &RecordKey::new("LR-9"), &change)
        .await
        .unwrap_err();

    assert!(matches!(err, hrdesk_core::Error::Remote { status: 422, .. }));
    assert_eq!(err.user_message(), "Leave balance is insufficient");
}

#[tokio::test]
async fn server_error_without_body_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let client = client_for(&server, session);

    let err = client
        .list_records(Feed::Leave, &PullParams::new())
        .await
        .unwrap_err();
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 503);
            assert!(message.contains("503"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let config = ApiClientConfig::new(format!("{}/api", server.uri()))
        .with_timeout(Duration::from_millis(50));
    let client = HrApiClient::new(config, session).unwrap();

    let err = client
        .list_records(Feed::Leave, &PullParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
}

#[tokio::test]
async fn status_change_puts_action_path_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/leave-requests/LR-3/reject"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "status": "Rejected",
            "remarks": "Team offsite",
            "updated_by": "hr@example.com",
            "effective_date": "2024-05-01"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let client = client_for(&server, session);
    let change = StatusChange::new(LeaveStatus::Rejected, "hr@example.com")
        .with_remarks("Team offsite")
        .with_field("effective_date", "2024-05-01");

    client
        .put_status(Feed::Leave, &RecordKey::new("LR-3"), &change)
        .await
        .unwrap();
}

#[tokio::test]
async fn attendance_status_change_uses_logs_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/attendance/logs/7/approve"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "status": "Approved",
            "updated_by": "hr@example.com"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let client = client_for(&server, session);
    let change = StatusChange::new(LeaveStatus::Approved, "hr@example.com");

    client
        .put_status(Feed::Attendance, &RecordKey::new("7"), &change)
        .await
        .unwrap();
}

#[tokio::test]
async fn store_keeps_optimistic_update_when_put_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leave-requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "reference_no": "LR-5", "status": "Pending", "employee": "Ada" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/leave-requests/LR-5/approve"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let (_, session) = signed_in("tok");
    let store = MergeStore::new(Feed::Leave, Arc::new(client_for(&server, session)));
    store.pull(&PullParams::new()).await.unwrap();

    let key = RecordKey::new("LR-5");
    let err = store
        .update_status(&key, StatusChange::new(LeaveStatus::Approved, "hr"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "boom");
    let record = store.get(&key).unwrap();
    assert_eq!(record.get_str("status"), Some("Approved"));
    assert_eq!(record.get_str("employee"), Some("Ada"));
}
