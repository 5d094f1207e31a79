//! Error types for the live monitor API layer.
//!
//! [`ApiError`] unifies all request-level failure modes into a single enum
//! that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. None of
//! these are fatal to the server; each maps to a 4xx/5xx JSON body.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path of the offending field, e.g. `entries[0].message`.
    pub field: String,
    /// What was wrong with it.
    pub message: String,
}

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No route matched.
    #[error("not found: {0}")]
    NotFound(String),

    /// The query string could not be parsed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The request body could not be parsed.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The input parsed but broke one or more validation rules.
    #[error("validation failed ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    /// The client exceeded its request budget.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the current window ends.
        retry_after_secs: u64,
    },

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuery(_) | Self::InvalidBody(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            Self::NotFound(msg) | Self::InvalidQuery(msg) | Self::InvalidBody(msg) => {
                serde_json::json!({ "error": msg, "status": status.as_u16() })
            }
            Self::Validation(details) => serde_json::json!({
                "error": "Validation failed",
                "status": status.as_u16(),
                "details": details,
            }),
            Self::RateLimited { retry_after_secs } => serde_json::json!({
                "error": "Too many requests",
                "status": status.as_u16(),
                "retryAfter": retry_after_secs,
            }),
            Self::Serialization(e) => {
                serde_json::json!({ "error": format!("JSON error: {e}"), "status": status.as_u16() })
            }
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
