use std::sync::Arc;

use crate::mailer::Mailer;
use crate::rate_limit::IpRateLimiter;
use crate::store::Store;

/// Presence flags for the `/test-db` diagnostic. Values never leave the
/// process; only the booleans are reported.
#[derive(Debug, Clone, Copy)]
pub struct EnvFlags {
    pub has_database_url: bool,
    pub has_admin_credentials: bool,
    pub has_smtp: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Trust proxy-supplied client-IP headers (behind a reverse proxy only).
    pub trust_proxy: bool,
    /// Per-IP limiter for certificate verification (public endpoint).
    pub verify_rate_limiter: Arc<IpRateLimiter>,
    /// Per-IP limiter for application submission.
    pub application_rate_limiter: Arc<IpRateLimiter>,
    /// Per-IP limiter for the contact form.
    pub contact_rate_limiter: Arc<IpRateLimiter>,
    /// Per-IP limiter for admin login attempts (strictest).
    pub login_rate_limiter: Arc<IpRateLimiter>,
    pub env_flags: EnvFlags,
}
