use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::rate_limit::RateLimitResult;

/// Axum extractor that resolves the TCP peer IP from `ConnectInfo<SocketAddr>`.
///
/// Returns `None` when `ConnectInfo` is unavailable (e.g. in tests that use
/// `Router::oneshot` without `into_make_service_with_connect_info`).
pub struct PeerIp(pub Option<String>);

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for PeerIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        Ok(Self(ip))
    }
}

/// Resolve the client IP used as the rate-limit key.
///
/// With `trust_proxy` set, `X-Real-IP` wins, then the first entry of
/// `X-Forwarded-For`; otherwise (or when neither header is present) the TCP
/// peer address is used, falling back to `"unknown"`. Proxy headers are
/// client-spoofable, so `trust_proxy` must stay off unless a trusted
/// reverse proxy overwrites them.
pub fn client_ip(headers: &HeaderMap, trust_proxy: bool, peer_ip: Option<&str>) -> String {
    if trust_proxy {
        if let Some(real_ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return real_ip.to_string();
        }
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return forwarded.to_string();
        }
    }
    peer_ip.map_or_else(|| "unknown".to_string(), ToString::to_string)
}

/// Build `X-RateLimit-*` response headers from a [`RateLimitResult`].
///
/// Numeric-to-string-to-`HeaderValue` parsing is infallible, so the internal
/// `unwrap()` calls cannot panic.
#[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
pub fn rate_limit_headers(result: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-ratelimit-limit",
        result.limit.to_string().parse().unwrap(),
    );
    headers.insert(
        "x-ratelimit-remaining",
        result.remaining.to_string().parse().unwrap(),
    );
    headers.insert(
        "x-ratelimit-reset",
        result.reset_after_secs.to_string().parse().unwrap(),
    );
    headers
}
