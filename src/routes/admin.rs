use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use super::ip::{PeerIp, client_ip, rate_limit_headers};
use crate::auth::{SESSION_TTL_SECONDS, credentials_match, generate_token, hash_token};
use crate::error::AppError;
use crate::sanitize;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminAuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// ── POST /admin-auth ────────────────────────────────────────────────────────

/// Exchanges admin credentials for a session token.
///
/// On success a random bearer token is issued; its hash is stored with an
/// expiry and checked on every admin request. The failure response never
/// says which of the two credentials was wrong.
///
/// # Errors
///
/// - `400 Bad Request` when username or password is missing.
/// - `401 Unauthorized` on wrong credentials.
/// - `429 Too Many Requests` past the per-IP login limit.
/// - `500 Internal Server Error` when admin credentials are not configured.
/// - `503 Service Unavailable` when the session store cannot be reached.
pub async fn admin_auth(
    State(state): State<AppState>,
    PeerIp(peer_ip): PeerIp,
    headers: HeaderMap,
    Json(req): Json<AdminAuthRequest>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, state.trust_proxy, peer_ip.as_deref());
    let rl = state.login_rate_limiter.check_and_record(ip.clone());
    if !rl.allowed {
        tracing::warn!(ip = %ip, "admin login rate limit hit");
        return Err(AppError::rate_limited(&rl));
    }

    if !sanitize::missing_fields(&[("username", &req.username), ("password", &req.password)])
        .is_empty()
    {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let (Some(admin_username), Some(admin_password)) = (
        state.admin_username.as_deref(),
        state.admin_password.as_deref(),
    ) else {
        return Err(AppError::Internal(
            "admin credentials not configured".to_string(),
        ));
    };

    if credentials_match(&req.username, admin_username)
        && credentials_match(&req.password, admin_password)
    {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::seconds(SESSION_TTL_SECONDS);
        state
            .store
            .create_admin_session(&hash_token(&token), expires_at)
            .await?;
        tracing::info!(ip = %ip, "admin login succeeded");
        Ok((
            StatusCode::OK,
            rate_limit_headers(&rl),
            Json(json!({
                "success": true,
                "message": "Authentication successful",
                "sessionToken": token,
                "expiresIn": SESSION_TTL_SECONDS,
            })),
        )
            .into_response())
    } else {
        tracing::warn!(ip = %ip, "admin login failed");
        Ok((
            StatusCode::UNAUTHORIZED,
            rate_limit_headers(&rl),
            Json(json!({
                "success": false,
                "error": "Invalid username or password",
            })),
        )
            .into_response())
    }
}
