// Relay errors - JSON error bodies with an HTTP status

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Generic message for any failure talking to an upstream
pub const PROCESSING_FAILED: &str = "Failed to process request";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub status: StatusCode,
    pub message: String,
}

impl RelayError {
    /// 400: required input missing or malformed
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 502: the proxied resource could not be fetched
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
