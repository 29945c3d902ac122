use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

use shared_models::{ApiError, ErrorBody};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("API error ({status}): {}", .body.message.as_deref().unwrap_or("no message"))]
    Status { status: u16, body: ErrorBody },

    #[error("Malformed response ({status}): {reason}")]
    Decode { status: u16, reason: String },
}

impl TransportError {
    /// Maps a transport failure onto the caller-facing taxonomy, using
    /// `default_message` wherever the server did not supply one.
    pub fn into_api_error(self, default_message: &str) -> ApiError {
        match self {
            TransportError::Request(_) | TransportError::InvalidHeader(_) => {
                ApiError::network(default_message)
            }
            TransportError::Status { status, body } => ApiError::Rejected {
                status,
                message: body
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| default_message.to_string()),
                errors: body.errors,
            },
            TransportError::Decode { status, .. } => ApiError::Malformed {
                status,
                message: default_message.to_string(),
            },
        }
    }
}
