//! Shared test utilities for route handler tests.
//!
//! Imported in each route module's `#[cfg(test)]` block via
//! `use crate::routes::test_helpers::*;`

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::panic)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};

use crate::auth::{generate_token, hash_token};
use crate::mailer::mock::RecordingMailer;
use crate::rate_limit::IpRateLimiter;
use crate::state::{AppState, EnvFlags};
use crate::store::Store;
use crate::store::memory::MemoryStore;

/// An `AppState` backed by an empty in-memory store, a recording mailer,
/// configured admin credentials, and generous rate limits.
pub fn make_state() -> AppState {
    make_state_with(Arc::new(MemoryStore::new()), Arc::new(RecordingMailer::new()))
}

/// Like [`make_state`] but with the caller's store and mailer.
pub fn make_state_with(store: Arc<dyn Store>, mailer: Arc<RecordingMailer>) -> AppState {
    AppState {
        store,
        mailer,
        admin_username: Some("admin".to_string()),
        admin_password: Some("correct horse battery staple".to_string()),
        trust_proxy: true,
        verify_rate_limiter: Arc::new(IpRateLimiter::new(1000, 60)),
        application_rate_limiter: Arc::new(IpRateLimiter::new(1000, 60)),
        contact_rate_limiter: Arc::new(IpRateLimiter::new(1000, 60)),
        login_rate_limiter: Arc::new(IpRateLimiter::new(1000, 60)),
        env_flags: EnvFlags {
            has_database_url: false,
            has_admin_credentials: true,
            has_smtp: false,
        },
    }
}

/// Create a live admin session in the state's store; returns the bearer token.
pub async fn issue_admin_token(state: &AppState) -> String {
    let token = generate_token();
    state
        .store
        .create_admin_session(&hash_token(&token), Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    token
}

/// Build a JSON POST request.
pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a JSON POST request carrying a bearer token.
pub fn authed_post_json(uri: &str, token: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request carrying a bearer token.
pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Assert an HTTP response has the expected status code and return the body
/// parsed as JSON. On failure the body is included in the panic message so
/// test output shows the server's error.
pub async fn assert_status(
    resp: axum::response::Response,
    expected: StatusCode,
) -> serde_json::Value {
    let actual = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 65536)
        .await
        .unwrap_or_default();
    if actual != expected {
        let body_str = String::from_utf8_lossy(&body);
        panic!(
            "assertion `left == right` failed\n  left: {actual}\n right: {expected}\n  body: {body_str}"
        );
    }
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
