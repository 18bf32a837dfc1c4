use super::{Mailer, OutgoingMail};

/// Mailer used when SMTP is not configured. Messages are dropped with a
/// debug log so intake endpoints keep working without a mail relay.
pub struct NoOpMailer;

#[async_trait::async_trait]
impl Mailer for NoOpMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        tracing::debug!(subject = %mail.subject, "SMTP not configured; dropping notification mail");
        Ok(())
    }
}
