pub mod admin;
pub mod applications;
pub mod certificates;
pub mod contact;
pub mod diag;
pub mod health;
pub mod ip;

#[cfg(test)]
pub mod test_helpers;

use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the router with all endpoints and the CORS layer wired.
pub fn create_router(state: AppState) -> Router {
    // The verification form is embedded on static pages served from other
    // origins, so the API is deliberately open to all origins. Wildcard
    // origins cannot be combined with credentials; auth rides in the
    // Authorization header instead.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health::health))
        .route("/test-db", get(diag::test_db))
        .route("/add-certificate", post(certificates::add_certificate))
        .route("/list-certificates", get(certificates::list_certificates))
        .route("/verify-certificate", post(certificates::verify_certificate))
        .route("/submit-application", post(applications::submit_application))
        .route("/sendMail", post(contact::send_mail))
        .route("/admin-auth", post(admin::admin_auth))
        .layer(cors)
        .with_state(state)
}
