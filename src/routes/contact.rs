use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ip::{PeerIp, client_ip, rate_limit_headers};
use crate::error::AppError;
use crate::mailer::contact_notification;
use crate::sanitize;
use crate::state::AppState;

/// The contact form posts `eaddress` rather than `email`; the field name is
/// part of the wire contract with the static pages.
#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub eaddress: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

// ── POST /sendMail ──────────────────────────────────────────────────────────

/// Relays a contact-form message to the admin mailbox, best-effort.
///
/// # Errors
///
/// - `400 Bad Request` on a missing field or invalid email/phone format.
/// - `429 Too Many Requests` past the per-IP limit.
pub async fn send_mail(
    State(state): State<AppState>,
    PeerIp(peer_ip): PeerIp,
    headers: HeaderMap,
    Json(req): Json<SendMailRequest>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, state.trust_proxy, peer_ip.as_deref());
    let rl = state.contact_rate_limiter.check_and_record(ip);
    if !rl.allowed {
        return Err(AppError::rate_limited(&rl));
    }

    let missing = sanitize::missing_fields(&[
        ("name", &req.name),
        ("eaddress", &req.eaddress),
        ("phone", &req.phone),
        ("message", &req.message),
    ]);
    if let Some(field) = missing.first() {
        return Err(AppError::BadRequest(format!(
            "Missing required field: {field}"
        )));
    }

    let email = sanitize::clean_email(&req.eaddress)
        .ok_or_else(|| AppError::BadRequest("Invalid email format".to_string()))?;
    let phone = sanitize::clean_phone(&req.phone)
        .ok_or_else(|| AppError::BadRequest("Invalid phone number format".to_string()))?;
    let name = sanitize::clean_name(&req.name);
    let message = sanitize::clean_text(&req.message);

    if let Err(err) = state
        .mailer
        .send(&contact_notification(&name, &email, &phone, &message))
        .await
    {
        tracing::warn!("contact form mail failed: {err:#}");
    }

    Ok((
        StatusCode::OK,
        rate_limit_headers(&rl),
        Json(json!({
            "message": "Message sent successfully! We will get back to you soon.",
            "status": "Success",
        })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::mailer::mock::RecordingMailer;
    use crate::rate_limit::IpRateLimiter;
    use crate::routes::test_helpers::*;
    use crate::store::memory::MemoryStore;

    fn body() -> serde_json::Value {
        json!({
            "name": "Grace Hopper",
            "eaddress": "grace@example.com",
            "phone": "555 000 222 333 4",
            "message": "Hello there!",
        })
    }

    #[tokio::test]
    async fn valid_message_returns_200_and_records_mail() {
        let mailer = Arc::new(RecordingMailer::new());
        let state = make_state_with(Arc::new(MemoryStore::new()), mailer.clone());
        let app = crate::routes::create_router(state);

        let resp = app.oneshot(post_json("/sendMail", &body())).await.unwrap();
        let json = assert_status(resp, StatusCode::OK).await;
        assert_eq!(
            json["message"],
            "Message sent successfully! We will get back to you soon."
        );

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "New Contact Form Message");
        assert!(sent[0].body.contains("Grace Hopper"));
    }

    #[tokio::test]
    async fn missing_message_field_is_400() {
        let app = crate::routes::create_router(make_state());
        let mut b = body();
        b["message"] = json!("   ");
        let resp = app.oneshot(post_json("/sendMail", &b)).await.unwrap();
        let json = assert_status(resp, StatusCode::BAD_REQUEST).await;
        assert_eq!(json["error"], "Missing required field: message");
    }

    #[tokio::test]
    async fn invalid_email_is_400() {
        let app = crate::routes::create_router(make_state());
        let mut b = body();
        b["eaddress"] = json!("nope");
        let resp = app.oneshot(post_json("/sendMail", &b)).await.unwrap();
        let json = assert_status(resp, StatusCode::BAD_REQUEST).await;
        assert_eq!(json["error"], "Invalid email format");
    }

    #[tokio::test]
    async fn mail_failure_still_returns_200() {
        let state = make_state_with(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingMailer::failing()),
        );
        let app = crate::routes::create_router(state);
        let resp = app.oneshot(post_json("/sendMail", &body())).await.unwrap();
        assert_status(resp, StatusCode::OK).await;
    }

    #[tokio::test]
    async fn markup_is_stripped_from_the_message() {
        let mailer = Arc::new(RecordingMailer::new());
        let state = make_state_with(Arc::new(MemoryStore::new()), mailer.clone());
        let app = crate::routes::create_router(state);
        let mut b = body();
        b["message"] = json!("<b>hi</b> javascript:alert(1)");
        let resp = app.oneshot(post_json("/sendMail", &b)).await.unwrap();
        assert_status(resp, StatusCode::OK).await;
        let sent = mailer.sent();
        assert!(!sent[0].body.contains('<'));
        assert!(!sent[0].body.contains("javascript:"));
    }

    #[tokio::test]
    async fn rate_limit_applies_per_ip() {
        let mut state = make_state();
        state.contact_rate_limiter = Arc::new(IpRateLimiter::new(1, 60));
        let app = crate::routes::create_router(state);

        let resp = app.clone().oneshot(post_json("/sendMail", &body())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = app.oneshot(post_json("/sendMail", &body())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
