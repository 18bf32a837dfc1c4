use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Liveness probe: always returns 200 while the process is running.
///
/// Never touches the store, so it stays responsive during a database
/// outage. `GET /test-db` is the check that exercises connectivity.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
