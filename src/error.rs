use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::rate_limit::RateLimitResult;
use crate::store::StoreError;

#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Store or upstream dependency unreachable; detail is logged, the
    /// client gets a generic retry message.
    Unavailable(String),
    RateLimited {
        retry_after_secs: u64,
        limit: u32,
        remaining: u32,
    },
    Unauthorized,
}

impl AppError {
    /// Construct a `RateLimited` error from a denied [`RateLimitResult`].
    pub const fn rate_limited(result: &RateLimitResult) -> Self {
        Self::RateLimited {
            retry_after_secs: result.reset_after_secs,
            limit: result.limit,
            remaining: result.remaining,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::Unavailable(msg) => write!(f, "unavailable: {msg}"),
            Self::RateLimited { .. } => write!(f, "rate limited"),
            Self::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    #[allow(clippy::unwrap_used)]
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::RateLimited {
                retry_after_secs,
                limit,
                remaining,
            } => {
                let mut headers = axum::http::HeaderMap::new();
                // Parsing numeric strings into HeaderValues never fails.
                headers.insert("retry-after", retry_after_secs.to_string().parse().unwrap());
                headers.insert("x-ratelimit-limit", limit.to_string().parse().unwrap());
                headers.insert(
                    "x-ratelimit-remaining",
                    remaining.to_string().parse().unwrap(),
                );
                headers.insert(
                    "x-ratelimit-reset",
                    retry_after_secs.to_string().parse().unwrap(),
                );
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    Json(json!({ "error": "Too many requests. Please try again later." })),
                )
                    .into_response()
            }
            Self::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error. Please try again later." })),
                )
                    .into_response()
            }
            Self::Unavailable(msg) => {
                tracing::error!("upstream unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "Service temporarily unavailable. Please try again later." })),
                )
                    .into_response()
            }
            Self::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            Self::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            Self::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::Conflict("Certificate ID already exists".to_string()),
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            StoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}
