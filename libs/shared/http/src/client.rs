use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::{ApiEnvelope, ErrorBody};

use crate::error::TransportError;

pub type QueryParams = Vec<(String, String)>;

/// Thin JSON client for the marketplace REST API.
///
/// Unwraps the `{success, data, message}` envelope and turns non-2xx
/// responses into [`TransportError::Status`]. It holds no per-request state
/// and can be shared freely.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

/// A successful (2xx, `success != false`) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl ApiResponse {
    /// Decodes the envelope payload, failing when it is missing or does not
    /// match `T`.
    pub fn into_data<T>(self) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        let status = self.status;
        let data = self.data.ok_or_else(|| TransportError::Decode {
            status,
            reason: "response carried no data".to_string(),
        })?;

        serde_json::from_value(data).map_err(|e| TransportError::Decode {
            status,
            reason: e.to_string(),
        })
    }
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.api_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers()?);

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Request to {} failed before a response arrived: {}", url, e);
            e
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("API error ({}): {}", status, text);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: ErrorBody::from_text(&text),
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str::<Value>(&text).unwrap_or_else(|e| {
                warn!("Unreadable JSON from {} ({}): {}", url, status, e);
                Value::Null
            })
        };

        let error_body = ErrorBody::from_value(&body);
        let envelope = ApiEnvelope::from_body(body);

        if !envelope.success {
            warn!("API reported failure with {}: {:?}", status, envelope.message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            data: envelope.data,
            message: envelope.message,
        })
    }

    pub async fn get(&self, path: &str, query: &QueryParams) -> Result<ApiResponse, TransportError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        self.request(Method::POST, path, &QueryParams::new(), Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        self.request(Method::PATCH, path, &QueryParams::new(), Some(body)).await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
