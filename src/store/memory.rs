use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use super::{
    Certificate, CertificateStatus, NewApplication, NewCertificate, Store, StoreError, StoreMode,
};

/// In-memory store used when no database is configured (mock mode) and in
/// tests. Data is lost on restart; every response built from it is flagged
/// with `mode: "mock"` by the handlers.
pub struct MemoryStore {
    next_id: AtomicI64,
    certificates: Mutex<Vec<Certificate>>,
    applications: Mutex<Vec<NewApplication>>,
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    // Fixed calendar dates always resolve; the fallback is never taken.
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn sample(
    id: i64,
    certificate_id: &str,
    participant_name: &str,
    program: &str,
    completion_date: &str,
    issued: DateTime<Utc>,
) -> Certificate {
    Certificate {
        id,
        certificate_id: certificate_id.to_string(),
        participant_name: participant_name.to_string(),
        program: program.to_string(),
        completion_date: completion_date.to_string(),
        issued_date: issued,
        status: CertificateStatus::Valid,
        created_at: issued,
        updated_at: issued,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            certificates: Mutex::new(Vec::new()),
            applications: Mutex::new(Vec::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// A store pre-seeded with the well-known sample certificates, so
    /// verification can be demonstrated without a database.
    pub fn with_samples() -> Self {
        let store = Self::new();
        {
            let mut certs = store
                .certificates
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            certs.push(sample(
                1,
                "PVI-2024-001",
                "John Doe",
                "Web Development Internship",
                "December 2024",
                sample_date(2024, 12, 15),
            ));
            certs.push(sample(
                2,
                "PVI-2024-002",
                "Jane Smith",
                "Machine Learning Internship",
                "November 2024",
                sample_date(2024, 11, 20),
            ));
            certs.push(sample(
                3,
                "PVI-2024-003",
                "Mike Johnson",
                "Full Stack Web Development",
                "October 2024",
                sample_date(2024, 10, 10),
            ));
        }
        store.next_id.store(4, Ordering::Relaxed);
        store
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Mock
    }

    async fn add_certificate(&self, cert: NewCertificate) -> Result<Certificate, StoreError> {
        let mut certs = self
            .certificates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Check and insert happen under the same lock, mirroring the
        // conditional insert of the database backend.
        if certs
            .iter()
            .any(|c| c.certificate_id == cert.certificate_id)
        {
            return Err(StoreError::Duplicate);
        }
        let now = Utc::now();
        let stored = Certificate {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            certificate_id: cert.certificate_id,
            participant_name: cert.participant_name,
            program: cert.program,
            completion_date: cert.completion_date,
            issued_date: cert.issued_date.unwrap_or(now),
            status: cert.status.unwrap_or(CertificateStatus::Valid),
            created_at: now,
            updated_at: now,
        };
        certs.push(stored.clone());
        Ok(stored)
    }

    async fn list_certificates(&self) -> Result<Vec<Certificate>, StoreError> {
        let certs = self
            .certificates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut out = certs.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn verify_certificate(
        &self,
        certificate_id: &str,
        participant_name: &str,
    ) -> Result<Option<Certificate>, StoreError> {
        let wanted_name = participant_name.trim().to_lowercase();
        let certs = self
            .certificates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(certs
            .iter()
            .find(|c| {
                c.certificate_id == certificate_id
                    && c.participant_name.to_lowercase() == wanted_name
            })
            .cloned())
    }

    async fn count_certificates(&self) -> Result<i64, StoreError> {
        let certs = self
            .certificates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(certs.len() as i64)
    }

    async fn submit_application(&self, application: NewApplication) -> Result<i64, StoreError> {
        let mut apps = self
            .applications
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        apps.push(application);
        Ok(apps.len() as i64)
    }

    async fn create_admin_session(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.insert(token_hash.to_string(), expires_at);
        Ok(())
    }

    async fn is_admin_session_valid(&self, token_hash: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.retain(|_, expires_at| *expires_at > now);
        Ok(sessions.contains_key(token_hash))
    }
}
