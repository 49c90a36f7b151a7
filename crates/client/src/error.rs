//! Error taxonomy for calls to the portfolio backend.
//!
//! Every failure, whether the request never left the machine or the backend
//! rejected it, surfaces as an [`ApiError`]. The UI renders it through the
//! uniform [`ErrorPayload`] shape.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use stockfolio_core::errors::{Error as CoreError, ValidationError};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Coarse error class used by the UI to pick a message and actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Network,
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Server,
    Unknown,
}

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend could not be reached, or did not answer before the timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// 401. The session has already been cleared when this is returned.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 400 with per-field messages, or input rejected before sending.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("Failed to parse response ({status}): {message}")]
    Decode { status: u16, message: String },

    #[error("Request failed ({status}): {message}")]
    Other { status: u16, message: String },

    /// Local failure (session storage, configuration).
    #[error(transparent)]
    Core(CoreError),
}

/// Uniform, serializable error shape for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    /// HTTP status; 0 when no response was received.
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
    /// Whether offering a retry action makes sense.
    pub retryable: bool,
}

/// Error body sent by the backend. Field names vary between endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, alias = "fieldErrors")]
    errors: Option<serde_json::Value>,
}

impl ApiError {
    /// Classifies a non-success response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorResponse>(body).unwrap_or_default();
        let field_errors = parsed
            .errors
            .as_ref()
            .map(field_error_map)
            .unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback_message(status, body));

        let code = status.as_u16();
        match code {
            400 => ApiError::Validation {
                message,
                field_errors,
            },
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::Server {
                status: code,
                message,
            },
            _ => ApiError::Other {
                status: code,
                message,
            },
        }
    }

    /// Classifies a transport failure. Timeouts count as network failures.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_decode() {
            ApiError::Decode {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Decode { .. } | ApiError::Other { .. } => ErrorKind::Unknown,
            ApiError::Core(CoreError::Validation(_)) => ErrorKind::Validation,
            ApiError::Core(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status of the failure; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Network(_) => 0,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Validation { .. } => 400,
            ApiError::Server { status, .. }
            | ApiError::Decode { status, .. }
            | ApiError::Other { status, .. } => *status,
            ApiError::Core(CoreError::Validation(_)) => 400,
            ApiError::Core(_) => 0,
        }
    }

    /// Transient failures worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ApiError::Validation { field_errors, .. } => field_errors.clone(),
            ApiError::Core(CoreError::Validation(v)) => v.field_errors(),
            _ => BTreeMap::new(),
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        let message = match self {
            ApiError::Network(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Decode { message, .. }
            | ApiError::Other { message, .. } => message.clone(),
            ApiError::Core(err) => err.to_string(),
        };
        ErrorPayload {
            kind: self.kind(),
            status: self.status(),
            message,
            field_errors: self.field_errors(),
            retryable: self.is_retryable(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Core(CoreError::Validation(err))
    }
}

/// Accepts `{"field": "msg"}`, `{"field": ["msg", ...]}` and
/// `[{"field": "...", "message": "..."}]`.
fn field_error_map(value: &serde_json::Value) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    match value {
        serde_json::Value::Object(fields) => {
            for (field, messages) in fields {
                if let Some(text) = message_text(messages) {
                    map.insert(field.clone(), text);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                let field = item.get("field").and_then(|f| f.as_str());
                let message = item
                    .get("message")
                    .or_else(|| item.get("defaultMessage"))
                    .and_then(message_text);
                if let (Some(field), Some(message)) = (field, message) {
                    map.insert(field.to_string(), message);
                }
            }
        }
        _ => {}
    }
    map
}

fn message_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let snippet: String = body.trim().chars().take(200).collect();
    if snippet.is_empty() || snippet.starts_with('{') {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    } else {
        snippet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_status_codes() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (400, ErrorKind::Validation),
            (500, ErrorKind::Server),
            (503, ErrorKind::Server),
            (409, ErrorKind::Unknown),
            (418, ErrorKind::Unknown),
        ];
        for (code, kind) in cases {
            let err = ApiError::from_response(StatusCode::from_u16(code).unwrap(), "");
            assert_eq!(err.kind(), kind, "status {}", code);
            assert_eq!(err.status(), code);
        }
    }

    #[test]
    fn test_validation_field_map_from_object() {
        let body = r#"{"message":"Invalid portfolio","errors":{"name":"must not be blank","description":["too long","bad chars"]}}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);

        let payload = err.payload();
        assert_eq!(payload.kind, ErrorKind::Validation);
        assert_eq!(payload.status, 400);
        assert_eq!(payload.message, "Invalid portfolio");
        assert_eq!(payload.field_errors["name"], "must not be blank");
        assert_eq!(payload.field_errors["description"], "too long; bad chars");
        assert!(!payload.retryable);
    }

    #[test]
    fn test_validation_field_map_from_list() {
        let body = r#"{"error":"Bad Request","fieldErrors":[{"field":"shares","message":"must be positive"}]}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.field_errors()["shares"], "must be positive");
        assert_eq!(err.payload().message, "Bad Request");
    }

    #[test]
    fn test_non_json_body_becomes_message() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream timed out");
        assert_eq!(err.payload().message, "upstream timed out");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, "");
        assert_eq!(err.payload().message, "Not Found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_network_payload_has_status_zero() {
        let payload = ApiError::Network("connection refused".to_string()).payload();
        assert_eq!(payload.kind, ErrorKind::Network);
        assert_eq!(payload.status, 0);
        assert!(payload.retryable);
    }

    #[test]
    fn test_local_validation_maps_to_validation_kind() {
        let err: ApiError = ValidationError::MissingField("name".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), 400);
        assert_eq!(err.field_errors()["name"], "is required");
    }

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = ApiError::Forbidden("nope".to_string()).payload();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "forbidden");
        assert_eq!(value["status"], 403);
        assert!(value.get("fieldErrors").is_none());
    }
}
