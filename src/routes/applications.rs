use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ip::{PeerIp, client_ip, rate_limit_headers};
use crate::error::AppError;
use crate::mailer::application_notification;
use crate::sanitize;
use crate::state::AppState;
use crate::store::NewApplication;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub internship: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub motivation: String,
}

// ── POST /submit-application ────────────────────────────────────────────────

/// Records an internship application and notifies the admin mailbox.
///
/// Mail delivery is best-effort: the applicant gets a success response even
/// when the notification cannot be sent.
///
/// # Errors
///
/// - `400 Bad Request` on a missing field or invalid email/phone format.
/// - `429 Too Many Requests` past the per-IP limit.
/// - `503 Service Unavailable` when the store cannot be reached.
pub async fn submit_application(
    State(state): State<AppState>,
    PeerIp(peer_ip): PeerIp,
    headers: HeaderMap,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, state.trust_proxy, peer_ip.as_deref());
    let rl = state.application_rate_limiter.check_and_record(ip);
    if !rl.allowed {
        return Err(AppError::rate_limited(&rl));
    }

    let missing = sanitize::missing_fields(&[
        ("fullName", &req.full_name),
        ("email", &req.email),
        ("phone", &req.phone),
        ("internship", &req.internship),
        ("motivation", &req.motivation),
    ]);
    if let Some(field) = missing.first() {
        return Err(AppError::BadRequest(format!(
            "Missing required field: {field}"
        )));
    }

    let email = sanitize::clean_email(&req.email)
        .ok_or_else(|| AppError::BadRequest("Invalid email format".to_string()))?;
    let phone = sanitize::clean_phone(&req.phone)
        .ok_or_else(|| AppError::BadRequest("Invalid phone number format".to_string()))?;
    let full_name = sanitize::clean_name(&req.full_name);
    if full_name.is_empty() {
        return Err(AppError::BadRequest(
            "Full name must contain letters".to_string(),
        ));
    }

    let application = NewApplication {
        full_name,
        email,
        phone,
        internship: sanitize::clean_text(&req.internship),
        experience: sanitize::clean_text(&req.experience),
        motivation: sanitize::clean_text(&req.motivation),
    };

    let id = state.store.submit_application(application.clone()).await?;
    tracing::info!(application_id = id, "application stored");

    if let Err(err) = state.mailer.send(&application_notification(&application)).await {
        tracing::warn!("application notification mail failed: {err:#}");
    }

    Ok((
        StatusCode::OK,
        rate_limit_headers(&rl),
        Json(json!({
            "message": "Application submitted successfully! We will review your submission and get back to you soon.",
            "status": "Success",
        })),
    )
        .into_response())
}
