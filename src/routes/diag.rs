use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::state::AppState;
use crate::store::StoreMode;

// ── GET /test-db ────────────────────────────────────────────────────────────

/// Store connectivity diagnostic.
///
/// Reports which backend is active, whether it answers, how many
/// certificates it holds, and which configuration values are present —
/// presence booleans only, never the values themselves.
pub async fn test_db(State(state): State<AppState>) -> Response {
    let env = json!({
        "hasDatabaseUrl": state.env_flags.has_database_url,
        "hasAdminCredentials": state.env_flags.has_admin_credentials,
        "hasSmtp": state.env_flags.has_smtp,
    });
    let mode = state.store.mode();

    match state.store.count_certificates().await {
        Ok(count) => {
            let message = match mode {
                StoreMode::Database => "Database connection successful",
                StoreMode::Mock => "DATABASE_URL is not set; serving in-memory mock data",
            };
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "mode": mode.as_str(),
                    "message": message,
                    "certificateCount": count,
                    "version": env!("CARGO_PKG_VERSION"),
                    "env": env,
                })),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!("store diagnostic failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "mode": mode.as_str(),
                    "message": "Database connection failed",
                    "version": env!("CARGO_PKG_VERSION"),
                    "env": env,
                })),
            )
                .into_response()
        }
    }
}
