//! Best-effort outbound notification mail.
//!
//! Delivery never decides an HTTP response: handlers log failures at `warn`
//! and carry on. The trait has one real implementation
//! ([`smtp::SmtpMailer`]) plus a no-op used when SMTP is unconfigured and a
//! recording mock for tests.

pub mod mock;
pub mod noop;
pub mod smtp;

use crate::store::NewApplication;

/// A fully-rendered message; sender and recipient come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver the message. Callers treat errors as non-fatal.
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Render the admin notification for a new internship application.
///
/// Plain text only — field values come from user input and have already
/// been sanitized, but giving them markup to work with buys nothing.
pub fn application_notification(application: &NewApplication) -> OutgoingMail {
    let experience = if application.experience.is_empty() {
        "Not provided"
    } else {
        &application.experience
    };
    OutgoingMail {
        subject: "New Internship Application".to_string(),
        body: format!(
            "New internship application received\n\n\
             Name: {}\n\
             Email: {}\n\
             Phone: {}\n\
             Preferred internship: {}\n\
             Previous experience: {}\n\n\
             Motivation:\n{}\n",
            application.full_name,
            application.email,
            application.phone,
            application.internship,
            experience,
            application.motivation,
        ),
    }
}

/// Render the admin notification for a contact-form message.
pub fn contact_notification(name: &str, email: &str, phone: &str, message: &str) -> OutgoingMail {
    OutgoingMail {
        subject: "New Contact Form Message".to_string(),
        body: format!(
            "New contact form message\n\n\
             Name: {name}\n\
             Email: {email}\n\
             Phone: {phone}\n\n\
             Message:\n{message}\n"
        ),
    }
}
