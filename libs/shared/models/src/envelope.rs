use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, FieldErrors};

/// `{ success, data, message }` wrapper every successful response uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T = Value> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl ApiEnvelope<Value> {
    /// Reads a response body as an envelope.
    ///
    /// Only objects carrying a boolean `success` flag are unwrapped; any
    /// other body is taken to be the payload itself.
    pub fn from_body(body: Value) -> Self {
        let flag = body
            .as_object()
            .and_then(|obj| obj.get("success"))
            .and_then(Value::as_bool);

        match (flag, body) {
            (Some(success), Value::Object(mut obj)) => ApiEnvelope {
                success,
                data: obj.remove("data").filter(|data| !data.is_null()),
                message: obj
                    .remove("message")
                    .and_then(|message| message.as_str().map(str::to_string)),
            },
            (_, body) => ApiEnvelope {
                success: true,
                data: if body.is_null() { None } else { Some(body) },
                message: None,
            },
        }
    }
}

/// `{ message, errors }` body carried by non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "deserialize_message")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_field_errors")]
    pub errors: FieldErrors,
}

impl ErrorBody {
    /// Lenient parse: anything that is not an error object yields an empty body.
    pub fn from_text(text: &str) -> Self {
        serde_json::from_str::<Value>(text)
            .map(|body| Self::from_value(&body))
            .unwrap_or_default()
    }

    /// Reads `message` and `errors` independently so a badly shaped
    /// `errors` never hides the server's message.
    pub fn from_value(body: &Value) -> Self {
        ErrorBody {
            message: body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            errors: body.get("errors").map(field_errors_from).unwrap_or_default(),
        }
    }
}

/// Field errors arrive as `{field: [msg, ..]}` or `{field: msg}`. Empty maps
/// are sometimes encoded as `[]`; any non-object is treated as no errors.
fn field_errors_from(raw: &Value) -> FieldErrors {
    let Some(fields) = raw.as_object() else {
        return FieldErrors::new();
    };

    fields
        .iter()
        .filter_map(|(field, messages)| {
            let messages = match messages {
                Value::String(single) => vec![single.clone()],
                Value::Array(list) => list
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect(),
                _ => return None,
            };
            Some((field.clone(), messages))
        })
        .collect()
}

fn deserialize_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().map(str::to_string))
}

fn deserialize_field_errors<'de, D>(deserializer: D) -> Result<FieldErrors, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(field_errors_from(&raw))
}

/// Uniform result shape handed to presentation code.
///
/// Serialises as `{success:true, data}` or
/// `{success:false, message, errors, status?}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperationOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> OperationOutcome<T> {
    pub fn succeeded(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            status: None,
        }
    }

    pub fn failed(error: &ApiError) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(error.message().to_string()),
            errors: Some(error.errors()),
            status: error.status(),
        }
    }
}

impl<T> From<Result<T, ApiError>> for OperationOutcome<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => OperationOutcome::succeeded(data),
            Err(err) => OperationOutcome::failed(&err),
        }
    }
}
