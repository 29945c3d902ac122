use std::collections::BTreeMap;

use thiserror::Error;

/// Validation messages keyed by field name, as the backend reports them.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failure of a single backend operation.
///
/// Every variant carries the message a caller should show. For transport
/// failures and unreadable bodies that is the operation's default message;
/// for rejections it is whatever the server said.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response was received.
    #[error("{message}")]
    Network { message: String },

    /// The server answered with a non-2xx status, or a 2xx envelope with
    /// `success: false`.
    #[error("{message} (HTTP {status})")]
    Rejected {
        status: u16,
        message: String,
        errors: FieldErrors,
    },

    /// The server answered 2xx but the payload could not be read.
    #[error("{message} (HTTP {status}: unreadable response)")]
    Malformed { status: u16, message: String },
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network { message: message.into() }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message }
            | ApiError::Rejected { message, .. }
            | ApiError::Malformed { message, .. } => message,
        }
    }

    pub fn errors(&self) -> FieldErrors {
        match self {
            ApiError::Rejected { errors, .. } => errors.clone(),
            ApiError::Network { .. } | ApiError::Malformed { .. } => FieldErrors::new(),
        }
    }

    /// HTTP status of the response, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network { .. } => None,
            ApiError::Rejected { status, .. } | ApiError::Malformed { status, .. } => Some(*status),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_has_no_status_or_field_errors() {
        let err = ApiError::network("Failed to update appointment status");
        assert_eq!(err.message(), "Failed to update appointment status");
        assert!(err.errors().is_empty());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Failed to update appointment status");
    }

    #[test]
    fn test_rejected_error_exposes_server_details() {
        let mut errors = FieldErrors::new();
        errors.insert("status".to_string(), vec!["invalid".to_string()]);
        let err = ApiError::Rejected {
            status: 422,
            message: "Cannot confirm a completed appointment".to_string(),
            errors: errors.clone(),
        };

        assert_eq!(err.status(), Some(422));
        assert_eq!(err.errors(), errors);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Cannot confirm a completed appointment (HTTP 422)");
    }
}
