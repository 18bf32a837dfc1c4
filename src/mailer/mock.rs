use std::sync::Mutex;

use super::{Mailer, OutgoingMail};

/// A mailer for tests: records every message, optionally failing each send.
// Intentionally not cfg(test)-gated: integration tests under tests/ build
// the crate without cfg(test) and still need the mock.
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingMailer {
    pub const fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A mailer whose every send fails, for exercising best-effort paths.
    pub const fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("simulated mail failure");
        }
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(mail.clone());
        Ok(())
    }
}
