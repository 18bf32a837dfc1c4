//! Certificate, application, and admin-session persistence.
//!
//! One trait, two backends chosen once at startup: [`postgres::PgStore`]
//! when `DATABASE_URL` is configured, [`memory::MemoryStore`] otherwise
//! (mock mode). Handlers report which backend answered via [`StoreMode`] so
//! a mock result can never be mistaken for a persisted one.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which backend is serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Database,
    Mock,
}

impl StoreMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Revoked,
    Expired,
}

impl CertificateStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "valid" => Some(Self::Valid),
            "revoked" => Some(Self::Revoked),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// A stored certificate record. Field names serialize in the wire format
/// the verification front-end expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: i64,
    pub certificate_id: String,
    pub participant_name: String,
    pub program: String,
    pub completion_date: String,
    pub issued_date: DateTime<Utc>,
    pub status: CertificateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Store::add_certificate`]; the store assigns id and the
/// created/updated timestamps.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub certificate_id: String,
    pub participant_name: String,
    pub program: String,
    pub completion_date: String,
    /// Defaults to now when the caller does not supply one.
    pub issued_date: Option<DateTime<Utc>>,
    /// Defaults to [`CertificateStatus::Valid`].
    pub status: Option<CertificateStatus>,
}

/// Input for [`Store::submit_application`]; `submitted_at` and the
/// `pending` status are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub internship: String,
    pub experience: String,
    pub motivation: String,
}

#[derive(Debug)]
pub enum StoreError {
    /// A certificate with this ID already exists.
    Duplicate,
    /// The backend could not be reached in time.
    Unavailable(String),
    Internal(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate => write!(f, "certificate id already exists"),
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            Self::Internal(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate,
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    fn mode(&self) -> StoreMode;

    /// Insert a certificate if no record with its `certificate_id` exists.
    ///
    /// The check and the insert are a single atomic operation in every
    /// backend, so two concurrent adds of the same ID resolve to exactly
    /// one success and one [`StoreError::Duplicate`].
    async fn add_certificate(&self, cert: NewCertificate) -> Result<Certificate, StoreError>;

    /// All certificates, newest first by creation time.
    async fn list_certificates(&self) -> Result<Vec<Certificate>, StoreError>;

    /// Look up a certificate by exact ID and case-insensitive participant
    /// name equality.
    async fn verify_certificate(
        &self,
        certificate_id: &str,
        participant_name: &str,
    ) -> Result<Option<Certificate>, StoreError>;

    async fn count_certificates(&self) -> Result<i64, StoreError>;

    /// Record a submitted application; returns the new record's id.
    async fn submit_application(&self, application: NewApplication) -> Result<i64, StoreError>;

    /// Persist an admin session token hash with its expiry.
    async fn create_admin_session(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// True when the token hash belongs to an unexpired session.
    async fn is_admin_session_valid(&self, token_hash: &str) -> Result<bool, StoreError>;
}
