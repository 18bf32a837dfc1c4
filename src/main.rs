use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certreg_server::config::Config;
use certreg_server::mailer::{Mailer, noop::NoOpMailer, smtp::SmtpMailer};
use certreg_server::rate_limit::IpRateLimiter;
use certreg_server::state::{AppState, EnvFlags};
use certreg_server::store::memory::MemoryStore;
use certreg_server::store::postgres::PgStore;
use certreg_server::store::Store;
use certreg_server::{db, routes};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certreg_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env();

    let store: Arc<dyn Store> = match cfg.database_url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            if cfg.run_migrations {
                db::run_migrations(&pool).await?;
            }
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; serving in-memory mock data. \
                 Nothing will be persisted and responses are flagged mode=mock."
            );
            Arc::new(MemoryStore::with_samples())
        }
    };

    let mailer: Arc<dyn Mailer> = if cfg.has_smtp() {
        // has_smtp() guarantees these are present.
        let host = cfg.smtp_host.clone().unwrap_or_default();
        let user = cfg.smtp_user.clone().unwrap_or_default();
        let pass = cfg.smtp_pass.clone().unwrap_or_default();
        let recipient = cfg.admin_email.clone().unwrap_or_else(|| user.clone());
        Arc::new(SmtpMailer::new(host, cfg.smtp_port, user, pass, recipient))
    } else {
        tracing::warn!("SMTP not configured; notification mail will be dropped");
        Arc::new(NoOpMailer)
    };

    if !cfg.has_admin_credentials() {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not configured; admin login is disabled");
    }

    let state = AppState {
        store,
        mailer,
        admin_username: cfg.admin_username.clone(),
        admin_password: cfg.admin_password.clone(),
        trust_proxy: cfg.trust_proxy,
        verify_rate_limiter: Arc::new(IpRateLimiter::new(5, 60)),
        application_rate_limiter: Arc::new(IpRateLimiter::new(5, 60)),
        contact_rate_limiter: Arc::new(IpRateLimiter::new(5, 60)),
        login_rate_limiter: Arc::new(IpRateLimiter::new(10, 3600)),
        env_flags: EnvFlags {
            has_database_url: cfg.database_url.is_some(),
            has_admin_credentials: cfg.has_admin_credentials(),
            has_smtp: cfg.has_smtp(),
        },
    };

    let app = routes::create_router(state).layer(
        // Header capture stays off so bearer tokens never reach the logs.
        TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().include_headers(false)),
    );
    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl_c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::warn!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
