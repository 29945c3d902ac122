use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub cache_ttl_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            api_token: Some("test-provider-token".to_string()),
            cache_ttl_secs: 120,
        }
    }
}

impl TestConfig {
    /// Config aimed at a mock server, e.g. `wiremock::MockServer::uri()`.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
            api_token: self.api_token.clone(),
            appointment_cache_ttl_secs: self.cache_ttl_secs,
        }
    }
}

pub struct MockMarketplaceResponses;

impl MockMarketplaceResponses {
    pub fn appointment(id: u64, status: &str) -> Value {
        json!({
            "id": id,
            "status": status,
            "service": {"id": 3, "name": "Deep cleaning"},
            "client": {"id": 11, "name": "Test Client"},
            "scheduled_at": "2026-10-20T09:00:00Z",
            "duration_minutes": 90
        })
    }

    /// Bare `{id, status}` payload as returned by status endpoints.
    pub fn status_payload(id: u64, status: &str) -> Value {
        json!({ "id": id, "status": status })
    }

    pub fn success(data: Value) -> Value {
        json!({
            "success": true,
            "data": data,
            "message": "OK"
        })
    }

    pub fn paginated(items: Vec<Value>, current_page: u64, last_page: u64, total: u64) -> Value {
        Self::success(json!({
            "data": items,
            "current_page": current_page,
            "last_page": last_page,
            "per_page": 15,
            "total": total
        }))
    }

    pub fn validation_error(message: &str, field: &str, errors: &[&str]) -> Value {
        let mut field_errors = serde_json::Map::new();
        field_errors.insert(field.to_string(), json!(errors));

        json!({
            "message": message,
            "errors": field_errors
        })
    }

    pub fn error(message: &str) -> Value {
        json!({
            "message": message,
            "errors": {}
        })
    }
}
