//! Admin session tokens.
//!
//! Logging in through `/admin-auth` issues a random bearer token; only its
//! SHA-256 hash is stored, with an expiry, and every admin request is
//! checked against that stored hash. A leaked database therefore never
//! exposes a usable token.

use axum::{extract::FromRequestParts, http::request::Parts};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

/// How long an issued admin session stays valid.
pub const SESSION_TTL_SECONDS: i64 = 8 * 60 * 60;

/// Tokens shorter than this are rejected before the store is consulted.
const MIN_TOKEN_LEN: usize = 10;

/// Generates a cryptographically random bearer token (64 hex chars = 32 bytes).
pub fn generate_token() -> String {
    use rand::RngCore;
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Returns the SHA-256 hex digest of the given token.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a submitted credential against the configured one.
///
/// Both sides are hashed first so the comparison cost does not depend on
/// where the strings diverge or how long the submitted value is.
pub fn credentials_match(submitted: &str, configured: &str) -> bool {
    hash_token(submitted) == hash_token(configured)
}

/// Proof of a valid admin session, extracted from
/// `Authorization: Bearer <token>`.
///
/// Rejections are a uniform 401 with no detail about which check failed.
#[derive(Debug, Clone)]
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;
        if token.len() < MIN_TOKEN_LEN {
            return Err(AppError::Unauthorized);
        }

        let token_hash = hash_token(token);
        match state.store.is_admin_session_valid(&token_hash).await {
            Ok(true) => Ok(Self),
            Ok(false) => Err(AppError::Unauthorized),
            // A dead store must fail closed, but as 503 rather than 401 so
            // clients do not discard their tokens.
            Err(err) => Err(AppError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn generate_token_returns_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_token_is_deterministic() {
        let token = "test-token-123";
        assert_eq!(hash_token(token), hash_token(token));
    }

    #[test]
    fn hash_token_returns_64_hex_chars() {
        let hash = hash_token("anything");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_produce_different_hashes() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn credentials_match_requires_exact_equality() {
        assert!(credentials_match("hunter2hunter2", "hunter2hunter2"));
        assert!(!credentials_match("hunter2hunter2", "hunter2hunter3"));
        assert!(!credentials_match("", "hunter2hunter2"));
    }
}
