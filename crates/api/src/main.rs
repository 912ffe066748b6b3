use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_api::auth::jwt::TokenIssuer;
use gatehouse_api::auth::password::PasswordHasher;
use gatehouse_api::auth::service::SessionPolicy;
use gatehouse_api::auth::AuthService;
use gatehouse_api::background;
use gatehouse_api::config::{LogFormat, ServerConfig, StorageConfig};
use gatehouse_api::router::build_app_router;
use gatehouse_api::state::AppState;
use gatehouse_db::{MemoryStore, PgStore, SessionStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Storage ---
    let (users, sessions) = open_store(&config.storage).await?;

    // --- Auth service ---
    let policy = SessionPolicy {
        session_ttl: chrono::Duration::hours(config.session_expiry_hours),
        revoke_on_password_change: config.revoke_sessions_on_password_change,
    };
    let auth = Arc::new(AuthService::new(
        users,
        sessions,
        PasswordHasher::default(),
        TokenIssuer::new(&config.jwt),
        policy,
    ));

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    let purge_handle = if config.session_purge_interval_secs > 0 {
        Some(tokio::spawn(background::session_purge::run(
            Arc::clone(&auth),
            Duration::from_secs(config.session_purge_interval_secs),
            cancel.clone(),
        )))
    } else {
        tracing::info!("Session purge job disabled");
        None
    };

    // --- Router ---
    let state = AppState { auth };
    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    if let Some(handle) = purge_handle {
        let budget = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(budget, handle).await.is_err() {
            tracing::warn!("Session purge job did not stop in time");
        }
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gatehouse_api=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Connect the configured storage backend.
///
/// For PostgreSQL this also checks connectivity and applies migrations.
async fn open_store(
    storage: &StorageConfig,
) -> anyhow::Result<(Arc<dyn UserStore>, Arc<dyn SessionStore>)> {
    match storage {
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = gatehouse_db::create_pool(url, *max_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!(max_connections, "Database connection pool created");

            gatehouse_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            gatehouse_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            let store = PgStore::new(pool);
            let users: Arc<dyn UserStore> = Arc::new(store.users);
            let sessions: Arc<dyn SessionStore> = Arc::new(store.sessions);
            Ok((users, sessions))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            let sessions: Arc<dyn SessionStore> = store;
            Ok((users, sessions))
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
