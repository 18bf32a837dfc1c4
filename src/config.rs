/// Runtime configuration, read once at startup.
pub struct Config {
    pub port: u16,
    /// When unset the server runs in mock mode: an in-memory store seeded
    /// with sample certificates, clearly flagged in every response.
    pub database_url: Option<String>,
    /// Set `RUN_MIGRATIONS=false` to manage migrations out-of-band.
    /// Defaults to `true`.
    pub run_migrations: bool,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    /// Recipient for intake notifications; falls back to `SMTP_USER`.
    pub admin_email: Option<String>,
    /// Trust `X-Real-IP` / `X-Forwarded-For` for client IPs. Only safe
    /// behind a reverse proxy that overwrites those headers.
    pub trust_proxy: bool,
}

// Custom Debug masks secrets so the struct is safe to log.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field(
                "database_url",
                &self.database_url.as_deref().map(|_| "<redacted>"),
            )
            .field("run_migrations", &self.run_migrations)
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_deref().map(|_| "<redacted>"),
            )
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field(
                "smtp_pass",
                &self.smtp_pass.as_deref().map(|_| "<redacted>"),
            )
            .field("admin_email", &self.admin_email)
            .field("trust_proxy", &self.trust_proxy)
            .finish()
    }
}

fn parse_port(var: &str, default: u16) -> u16 {
    std::env::var(var).ok().map_or(default, |s| match s.parse::<u16>() {
        Ok(0) | Err(_) => {
            tracing::warn!(
                "{var} env var {s:?} is not a valid port number (1-65535), defaulting to {default}"
            );
            default
        }
        Ok(port) => port,
    })
}

/// Read an env var, treating empty/whitespace-only values as unset.
fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let run_migrations = std::env::var("RUN_MIGRATIONS")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);
        let trust_proxy = std::env::var("TRUST_PROXY")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        Self {
            port: parse_port("PORT", 8080),
            database_url: non_empty_var("DATABASE_URL"),
            run_migrations,
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            smtp_host: non_empty_var("SMTP_HOST"),
            smtp_port: parse_port("SMTP_PORT", 587),
            smtp_user: non_empty_var("SMTP_USER"),
            smtp_pass: non_empty_var("SMTP_PASS"),
            admin_email: non_empty_var("ADMIN_EMAIL"),
            trust_proxy,
        }
    }

    /// True when username and password are both configured.
    pub const fn has_admin_credentials(&self) -> bool {
        self.admin_username.is_some() && self.admin_password.is_some()
    }

    /// True when host, user, and password are all configured.
    pub const fn has_smtp(&self) -> bool {
        self.smtp_host.is_some() && self.smtp_user.is_some() && self.smtp_pass.is_some()
    }
}
