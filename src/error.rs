//! Failure taxonomy for a conversation turn.
//!
//! The `Display` text of every variant is the exact message shown to the user
//! in the assistant bubble and stored as the conversation's last error.

use serde_json::Value;
use thiserror::Error;

/// Fallback shown when nothing more specific is known about a failure.
pub const GENERIC_FAILURE: &str = "Failed to get response. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("API key configuration error. Please check backend settings.")]
    Unauthorized,

    #[error("Connection timeout to external service. Please try again later.")]
    GatewayTimeout,

    #[error(
        "Backend API endpoint not found. Please ensure the backend service is running on port 8000."
    )]
    NotFound,

    /// No response at all: connection refused, DNS or TLS failure.
    #[error(
        "Unable to connect to the backend service. Please ensure the backend is running and accessible."
    )]
    Unreachable,

    /// The server's own `detail` field.
    #[error("{0}")]
    Detail(String),

    #[error("API request failed with status {0}")]
    Status(u16),

    /// Transport failure after the connection was made, e.g. a timeout.
    #[error("{0}")]
    Transport(String),

    #[error("{}", GENERIC_FAILURE)]
    NoResponse,

    /// 2xx whose body is not a usable answer.
    #[error("{}", GENERIC_FAILURE)]
    MalformedResponse { reason: String },
}

impl ApiError {
    /// Normalize a non-2xx HTTP outcome.
    ///
    /// 401, 504, 404 and 0 always win. For any other status a `detail` field
    /// in a JSON body replaces the templated message. A body that is not JSON
    /// behaves like an empty object.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            504 => ApiError::GatewayTimeout,
            404 => ApiError::NotFound,
            0 => ApiError::Unreachable,
            _ => match detail_message(body) {
                Some(detail) => ApiError::Detail(detail),
                None => ApiError::Status(status),
            },
        }
    }

    /// Normalize a transport failure that produced no status.
    pub fn from_transport(message: &str) -> Self {
        if message.trim().is_empty() {
            ApiError::NoResponse
        } else {
            ApiError::Transport(message.to_string())
        }
    }

    /// Returns the HTTP status this error was derived from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::GatewayTimeout => Some(504),
            ApiError::NotFound => Some(404),
            ApiError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

/// Extract a usable `detail` value from an error body.
///
/// Strings are taken verbatim; other truthy values (FastAPI sends an array of
/// validation errors) are rendered as compact JSON. Falsy values are ignored.
fn detail_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    match parsed.get("detail")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(detail) if detail.is_empty() => None,
        Value::String(detail) => Some(detail.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
