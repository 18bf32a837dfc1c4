use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use super::{Mailer, OutgoingMail};

/// Minimal SMTP submission client (EHLO / AUTH LOGIN / MAIL / RCPT / DATA).
///
/// Every network round trip is bounded by a timeout so a stalled relay can
/// never hold a request open past the caller's patience. No TLS: this
/// client is meant for a local relay or a submission port terminated by
/// infrastructure in front of it.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
    to: String,
    command_timeout: Duration,
}

impl SmtpMailer {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            host: host.into(),
            port,
            from: username.clone(),
            username,
            password: password.into(),
            to: recipient.into(),
            command_timeout: Duration::from_secs(15),
        }
    }

    /// Override the per-round-trip timeout (mainly for tests).
    pub fn with_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }
}

struct SmtpConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    command_timeout: Duration,
}

impl SmtpConnection {
    /// Read one (possibly multi-line) reply and return its status code.
    /// Continuation lines use `NNN-`, the final line `NNN `.
    async fn read_reply(&mut self) -> Result<u16> {
        loop {
            let mut line = String::new();
            let n = timeout(self.command_timeout, self.reader.read_line(&mut line))
                .await
                .context("timed out waiting for SMTP reply")?
                .context("failed to read SMTP reply")?;
            if n == 0 {
                bail!("SMTP connection closed unexpectedly");
            }
            if line.len() >= 4 && line.as_bytes()[3] == b'-' {
                continue;
            }
            let code = line
                .get(..3)
                .and_then(|s| s.parse::<u16>().ok())
                .with_context(|| format!("malformed SMTP reply: {line:?}"))?;
            return Ok(code);
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        timeout(
            self.command_timeout,
            self.writer.write_all(format!("{line}\r\n").as_bytes()),
        )
        .await
        .context("timed out sending SMTP command")?
        .context("failed to send SMTP command")
    }

    /// Send one line and require the given reply code.
    async fn exchange(&mut self, line: &str, expected: u16) -> Result<()> {
        self.write_line(line).await?;
        let code = self.read_reply().await?;
        if code != expected {
            bail!("SMTP reply {code}, expected {expected}");
        }
        Ok(())
    }
}

/// Dot-stuff and CRLF-terminate a message body for the DATA phase.
fn encode_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 16);
    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
        out.push_str("\r\n");
    }
    out
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let stream = timeout(
            self.command_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .context("timed out connecting to SMTP relay")?
        .context("failed to connect to SMTP relay")?;

        let (read_half, write_half) = stream.into_split();
        let mut conn = SmtpConnection {
            reader: BufReader::new(read_half),
            writer: write_half,
            command_timeout: self.command_timeout,
        };

        let greeting = conn.read_reply().await?;
        if greeting != 220 {
            bail!("SMTP greeting {greeting}, expected 220");
        }

        conn.exchange("EHLO certreg-server", 250).await?;
        conn.exchange("AUTH LOGIN", 334).await?;
        conn.exchange(&BASE64.encode(&self.username), 334).await?;
        conn.exchange(&BASE64.encode(&self.password), 235).await?;
        conn.exchange(&format!("MAIL FROM:<{}>", self.from), 250)
            .await?;
        conn.exchange(&format!("RCPT TO:<{}>", self.to), 250).await?;
        conn.exchange("DATA", 354).await?;

        let message = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\r\n{}",
            self.from,
            self.to,
            mail.subject,
            encode_body(&mail.body),
        );
        conn.write_line(&format!("{message}.")).await?;
        let code = conn.read_reply().await?;
        if code != 250 {
            bail!("SMTP reply {code} after message data, expected 250");
        }

        // Best-effort goodbye; the message is already accepted.
        let _ = conn.write_line("QUIT").await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use tokio::net::TcpListener;

    /// Scripted relay: answers each client line with the canned SMTP reply
    /// and returns everything the client sent.
    async fn fake_relay(listener: TcpListener, accept_password: bool) -> Vec<String> {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        write_half.write_all(b"220 relay ready\r\n").await.unwrap();

        let mut seen = Vec::new();
        // 0 = idle, 1 = expecting username, 2 = expecting password,
        // 3 = reading message data
        let mut auth_stage = 0u8;
        let mut in_data = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            seen.push(line.clone());

            if in_data {
                if line == "." {
                    in_data = false;
                    write_half.write_all(b"250 accepted\r\n").await.unwrap();
                }
                continue;
            }

            let reply: &[u8] = match auth_stage {
                1 => {
                    auth_stage = 2;
                    b"334 UGFzc3dvcmQ6\r\n"
                }
                2 => {
                    auth_stage = 0;
                    if accept_password {
                        b"235 authenticated\r\n"
                    } else {
                        b"535 bad credentials\r\n"
                    }
                }
                _ if line.starts_with("EHLO") => b"250 relay greets you\r\n",
                _ if line == "AUTH LOGIN" => {
                    auth_stage = 1;
                    b"334 VXNlcm5hbWU6\r\n"
                }
                _ if line.starts_with("MAIL FROM:") => b"250 ok\r\n",
                _ if line.starts_with("RCPT TO:") => b"250 ok\r\n",
                _ if line == "DATA" => {
                    in_data = true;
                    b"354 go ahead\r\n"
                }
                _ if line == "QUIT" => {
                    write_half.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                }
                _ => b"500 unrecognized\r\n",
            };
            write_half.write_all(reply).await.unwrap();
        }
        seen
    }

    fn mailer_for(addr: std::net::SocketAddr) -> SmtpMailer {
        SmtpMailer::new(
            addr.ip().to_string(),
            addr.port(),
            "mailer@example.com",
            "mail-secret",
            "admin@example.com",
        )
        .with_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn delivers_message_through_full_smtp_dialogue() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = tokio::spawn(fake_relay(listener, true));

        let mail = OutgoingMail {
            subject: "New Contact Form Message".to_string(),
            body: "Name: Grace Hopper\n.starts with a dot\n".to_string(),
        };
        mailer_for(addr).send(&mail).await.unwrap();

        let seen = relay.await.unwrap();
        assert!(seen.iter().any(|l| l == "MAIL FROM:<mailer@example.com>"));
        assert!(seen.iter().any(|l| l == "RCPT TO:<admin@example.com>"));
        assert!(
            seen.iter()
                .any(|l| l == "Subject: New Contact Form Message")
        );
        // Dot-stuffing: a body line starting with '.' gains a second dot.
        assert!(seen.iter().any(|l| l == "..starts with a dot"));
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _relay = tokio::spawn(fake_relay(listener, false));

        let mail = OutgoingMail {
            subject: "x".to_string(),
            body: "y".to_string(),
        };
        let err = mailer_for(addr).send(&mail).await.unwrap_err();
        assert!(err.to_string().contains("535"), "got: {err}");
    }

    #[tokio::test]
    async fn unreachable_relay_fails_within_timeout() {
        // Bind a listener and drop it so the port is closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mail = OutgoingMail {
            subject: "x".to_string(),
            body: "y".to_string(),
        };
        let result = mailer_for(addr).send(&mail).await;
        assert!(result.is_err());
    }
}
