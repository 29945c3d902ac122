use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_http::{ApiClient, QueryParams, TransportError};

fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    let mut config = AppConfig::for_base_url(server.uri());
    config.api_token = token.map(str::to_string);
    ApiClient::new(&config)
}

#[tokio::test]
async fn test_get_sends_auth_header_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/json"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": 1}],
            "message": "Appointments retrieved"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("secret-token"));
    let query: QueryParams = vec![("status".to_string(), "pending".to_string())];
    let response = client
        .get("/api/provider/appointments", &query)
        .await
        .expect("request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.data, Some(json!([{"id": 1}])));
    assert_eq!(response.message.as_deref(), Some("Appointments retrieved"));
}

#[tokio::test]
async fn test_patch_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/provider/appointments/5/status"))
        .and(body_json(json!({"status": "confirmed", "notes": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"id": 5, "status": "confirmed"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let response = client
        .patch(
            "/api/provider/appointments/5/status",
            &json!({"status": "confirmed", "notes": null}),
        )
        .await
        .expect("request should succeed");

    let data: serde_json::Value = response.into_data().expect("data present");
    assert_eq!(data["status"], "confirmed");
}

#[tokio::test]
async fn test_non_success_status_carries_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Appointment not found",
            "errors": {}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let err = client
        .get("/api/provider/appointments/9", &QueryParams::new())
        .await
        .unwrap_err();

    assert_matches!(err, TransportError::Status { status: 404, ref body }
        if body.message.as_deref() == Some("Appointment not found"));
}

#[tokio::test]
async fn test_success_false_envelope_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/provider/appointments/3/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Appointment has not started",
            "errors": {"status": "must be in_progress"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let err = client
        .post("/api/provider/appointments/3/complete", &json!({}))
        .await
        .unwrap_err();

    assert_matches!(err, TransportError::Status { status: 200, ref body }
        if body.message.as_deref() == Some("Appointment has not started")
            && body.errors["status"] == vec!["must be in_progress".to_string()]);
}

#[tokio::test]
async fn test_success_false_with_list_errors_keeps_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/provider/appointments/4/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Invoice could not be created",
            "errors": []
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let err = client
        .post("/api/provider/appointments/4/complete", &json!({}))
        .await
        .unwrap_err();

    assert_matches!(err, TransportError::Status { status: 200, ref body }
        if body.message.as_deref() == Some("Invoice could not be created") && body.errors.is_empty());
}

#[tokio::test]
async fn test_unreadable_success_body_yields_no_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/today"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let response = client
        .get("/api/provider/appointments/today", &QueryParams::new())
        .await
        .expect("2xx should not be an error");

    assert!(response.data.is_none());
    assert_matches!(
        response.into_data::<serde_json::Value>(),
        Err(TransportError::Decode { status: 200, .. })
    );
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    // Nothing listens on port 1.
    let config = AppConfig::for_base_url("http://127.0.0.1:1");

    let client = ApiClient::new(&config);
    let err = client
        .get("/api/provider/appointments", &QueryParams::new())
        .await
        .unwrap_err();

    assert_matches!(err, TransportError::Request(_));
}
