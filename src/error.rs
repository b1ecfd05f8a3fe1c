//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the service. Only payload
//! validation errors ever reach an HTTP caller; queue and store failures
//! are absorbed at the operation boundary and logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "detail": "Missing 'msg' key in the payload."
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    pub detail: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// The fire-and-forget contract means the queue and store variants are
/// logged and swallowed before a response is built; in practice only
/// [`RelayError::MissingMsg`] and [`RelayError::InvalidRequest`] are
/// ever converted into responses.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Request body did not contain a string-valued `msg` key.
    #[error("Missing 'msg' key in the payload.")]
    MissingMsg,

    /// Request body was otherwise malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Queue client failed to initialize or a queue operation failed.
    #[error("queue error: {0}")]
    Queue(String),

    /// Document store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingMsg | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Queue(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
