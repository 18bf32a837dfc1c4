use std::sync::LazyLock;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use super::ip::{PeerIp, client_ip, rate_limit_headers};
use crate::auth::AdminSession;
use crate::error::AppError;
use crate::sanitize;
use crate::state::AppState;
use crate::store::{CertificateStatus, NewCertificate};

const CERTIFICATE_ID_FORMAT_ERROR: &str =
    "Certificate ID must be in format: XXX-YYYY-NNN (e.g., PVI-2024-001)";

// Verification accepts plain names only; hyphenated/apostrophe names are
// stored via clean_name, which strips nothing a certificate holder types
// here in practice. Pattern is a compile-time constant.
#[allow(clippy::expect_used)]
static VERIFY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]{2,50}$").expect("valid name regex"));

// ── Request types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCertificateRequest {
    #[serde(default)]
    pub certificate_id: String,
    #[serde(default)]
    pub participant_name: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub completion_date: String,
    /// ISO 8601; defaults to the time of the request.
    #[serde(default)]
    pub issued_date: Option<String>,
    #[serde(default)]
    pub status: Option<CertificateStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCertificateRequest {
    #[serde(default)]
    pub certificate_id: String,
    #[serde(default)]
    pub participant_name: String,
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn parse_issued_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ── POST /add-certificate ───────────────────────────────────────────────────

/// Registers a new certificate. Admin session required.
///
/// # Errors
///
/// - `400 Bad Request` on a missing field, a malformed certificate ID, or an
///   unparseable `issuedDate`.
/// - `401 Unauthorized` without a valid admin session.
/// - `409 Conflict` when the certificate ID is already registered.
/// - `503 Service Unavailable` when the store cannot be reached.
pub async fn add_certificate(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<AddCertificateRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let missing = sanitize::missing_fields(&[
        ("certificateId", &req.certificate_id),
        ("participantName", &req.participant_name),
        ("program", &req.program),
        ("completionDate", &req.completion_date),
    ]);
    if let Some(field) = missing.first() {
        return Err(AppError::BadRequest(format!(
            "Missing required field: {field}"
        )));
    }

    let certificate_id = sanitize::clean_certificate_id(&req.certificate_id)
        .ok_or_else(|| AppError::BadRequest(CERTIFICATE_ID_FORMAT_ERROR.to_string()))?;
    let participant_name = sanitize::clean_name(&req.participant_name);
    if participant_name.is_empty() {
        return Err(AppError::BadRequest(
            "Participant name must contain letters".to_string(),
        ));
    }

    let issued_date = match req
        .issued_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(raw) => Some(parse_issued_date(raw).ok_or_else(|| {
            AppError::BadRequest(
                "issuedDate must be an ISO 8601 date (e.g., 2024-12-15)".to_string(),
            )
        })?),
        None => None,
    };

    let cert = state
        .store
        .add_certificate(NewCertificate {
            certificate_id,
            participant_name,
            program: sanitize::clean_text(&req.program),
            completion_date: sanitize::clean_text(&req.completion_date),
            issued_date,
            status: req.status,
        })
        .await?;

    tracing::info!(certificate_id = %cert.certificate_id, "certificate added");
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Certificate added successfully!",
            "certificateId": cert.certificate_id,
            "participantName": cert.participant_name,
            "status": "Success",
            "mode": state.store.mode().as_str(),
        })),
    ))
}

// ── GET /list-certificates ──────────────────────────────────────────────────

/// All certificates, newest first. Admin session required.
///
/// # Errors
///
/// - `401 Unauthorized` without a valid admin session.
/// - `503 Service Unavailable` when the store cannot be reached.
pub async fn list_certificates(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let certificates = state.store.list_certificates().await?;
    Ok(Json(json!({
        "certificates": certificates,
        "total": certificates.len(),
        "message": format!("Found {} certificate(s)", certificates.len()),
        "mode": state.store.mode().as_str(),
    })))
}

// ── POST /verify-certificate ────────────────────────────────────────────────

/// Public certificate check, rate-limited per client IP.
///
/// # Errors
///
/// - `400 Bad Request` on missing fields or malformed ID/name.
/// - `404 Not Found` when no certificate matches (body carries
///   `verified: false` and remediation suggestions).
/// - `429 Too Many Requests` past the per-IP limit.
/// - `503 Service Unavailable` when the store cannot be reached.
pub async fn verify_certificate(
    State(state): State<AppState>,
    PeerIp(peer_ip): PeerIp,
    headers: HeaderMap,
    Json(req): Json<VerifyCertificateRequest>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, state.trust_proxy, peer_ip.as_deref());
    let rl = state.verify_rate_limiter.check_and_record(ip);
    if !rl.allowed {
        return Err(AppError::rate_limited(&rl));
    }

    if req.certificate_id.trim().is_empty() || req.participant_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Certificate ID and Participant Name are required".to_string(),
        ));
    }
    let certificate_id = sanitize::clean_certificate_id(&req.certificate_id)
        .ok_or_else(|| AppError::BadRequest(CERTIFICATE_ID_FORMAT_ERROR.to_string()))?;
    let participant_name = req.participant_name.trim();
    if !VERIFY_NAME_RE.is_match(participant_name) {
        return Err(AppError::BadRequest(
            "Participant name must be 2-50 characters and contain only letters and spaces"
                .to_string(),
        ));
    }

    let found = state
        .store
        .verify_certificate(&certificate_id, participant_name)
        .await?;
    tracing::info!(
        certificate_id = %certificate_id,
        found = found.is_some(),
        "certificate verification attempt"
    );

    let rl_headers = rate_limit_headers(&rl);
    let mode = state.store.mode().as_str();
    let response = match found {
        Some(cert) => (
            StatusCode::OK,
            rl_headers,
            Json(json!({
                "status": "Success",
                "verified": true,
                "certificate": {
                    "id": cert.certificate_id,
                    "participantName": cert.participant_name,
                    "program": cert.program,
                    "completionDate": cert.completion_date,
                    "status": cert.status,
                    "issuedDate": cert.issued_date,
                },
                "message": "Certificate verified successfully!",
                "mode": mode,
            })),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            rl_headers,
            Json(json!({
                "status": "Error",
                "verified": false,
                "message": "Certificate not found or invalid. Please check the certificate ID and participant name.",
                "suggestions": [
                    "Verify the certificate ID is correct",
                    "Ensure the participant name matches the certificate",
                    "Check that the certificate was issued by this program",
                    "Contact support if you believe this is an error",
                ],
                "mode": mode,
            })),
        )
            .into_response(),
    };
    Ok(response)
}
