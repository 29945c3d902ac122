use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentFilter, AppointmentId, AppointmentStatus, DashboardSection,
};
use appointment_cell::services::{AppointmentQueryService, AppointmentStatusClient, ResponseCache};
use shared_config::AppConfig;
use shared_http::ApiClient;
use shared_models::ApiError;
use shared_utils::test_utils::{MockMarketplaceResponses, TestConfig};

struct Services {
    queries: AppointmentQueryService,
    status: AppointmentStatusClient,
}

fn services(config: &AppConfig) -> Services {
    let api = Arc::new(ApiClient::new(config));
    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));

    Services {
        queries: AppointmentQueryService::with_cache(api.clone(), cache.clone()),
        status: AppointmentStatusClient::with_cache(api, cache),
    }
}

#[tokio::test]
async fn test_list_appointments_sends_filters_and_reads_paginator() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments"))
        .and(query_param("status", "pending"))
        .and(query_param("per_page", "2"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::paginated(
            vec![
                MockMarketplaceResponses::appointment(1, "pending"),
                MockMarketplaceResponses::appointment(2, "pending"),
            ],
            1,
            4,
            7,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);

    let filter = AppointmentFilter {
        status: Some(AppointmentStatus::Pending),
        per_page: Some(2),
        page: Some(1),
        ..Default::default()
    };
    let page = svc.queries.list_appointments(&filter).await.expect("list should succeed");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 7);
    assert_eq!(page.last_page, 4);
    assert!(page.has_more());
}

#[tokio::test]
async fn test_malformed_list_degrades_to_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::success(
            json!({"unexpected": true}),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/dashboard/upcoming"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);

    assert!(svc.queries.today_appointments().await.unwrap().is_empty());
    assert!(svc
        .queries
        .dashboard(DashboardSection::Upcoming)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_dashboard_section_and_stats() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/dashboard/cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::success(
            json!([MockMarketplaceResponses::appointment(4, "cancelled_by_client")]),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::success(
            json!({"total": 12, "pending": 3, "completed": 8, "revenue": 1520.5}),
        )))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);

    let cancelled = svc.queries.dashboard(DashboardSection::Cancelled).await.unwrap();
    assert_eq!(cancelled.len(), 1);
    assert!(cancelled[0].status.is_cancelled());

    let stats = svc.queries.dashboard_stats().await.unwrap();
    assert_eq!(stats.total, 12);
    assert_eq!(stats.pending, 3);
    assert_eq!(stats.cancelled, 0);
    assert_eq!(stats.extra["revenue"], 1520.5);
}

#[tokio::test]
async fn test_list_failure_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments"))
        .respond_with(ResponseTemplate::new(403).set_body_json(MockMarketplaceResponses::error(
            "This action is unauthorized.",
        )))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);

    let err = svc
        .queries
        .list_appointments(&AppointmentFilter::default())
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Rejected { status: 403, ref message, .. }
        if message == "This action is unauthorized.");
}

#[tokio::test]
async fn test_get_appointment_reads_through_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::success(
            MockMarketplaceResponses::appointment(15, "confirmed"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);
    let id = AppointmentId::from(15u64);

    let first = svc.queries.get_appointment(&id).await.unwrap();
    let second = svc.queries.get_appointment(&id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(svc.status.get_cached("appointment_15").await, Some(first));
}

#[tokio::test]
async fn test_fetch_appointment_bypasses_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/16"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::success(
            MockMarketplaceResponses::appointment(16, "in_progress"),
        )))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);
    let id = AppointmentId::from(16u64);

    svc.queries.fetch_appointment(&id).await.unwrap();
    let fresh = svc.queries.fetch_appointment(&id).await.unwrap();
    assert_eq!(fresh.status, AppointmentStatus::InProgress);
}

#[tokio::test]
async fn test_missing_appointment_is_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);

    let err = svc
        .queries
        .get_appointment(&AppointmentId::from(99u64))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Failed to fetch appointment details");
    assert!(svc.status.get_cached("appointment_99").await.is_none());
}

#[tokio::test]
async fn test_slow_read_does_not_resurrect_pre_transition_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/provider/appointments/50"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(MockMarketplaceResponses::success(
                    MockMarketplaceResponses::appointment(50, "pending"),
                )),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/provider/appointments/50/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockMarketplaceResponses::success(
            MockMarketplaceResponses::status_payload(50, "confirmed"),
        )))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let svc = services(&config);
    let id = AppointmentId::from(50u64);

    let (read, update) = futures::join!(
        svc.queries.fetch_appointment(&id),
        svc.status.confirm(&id, None),
    );

    assert_eq!(read.unwrap().status, AppointmentStatus::Pending);
    assert_eq!(update.unwrap().status, AppointmentStatus::Confirmed);
    assert!(svc.status.get_cached("appointment_50").await.is_none());
}
