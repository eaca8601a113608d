mod config;
mod pages;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use atrium_api::session::SessionStore;
use atrium_api::{AppState, AppStateInner, routes};
use atrium_mailer::Mailer;
use atrium_store::{MemoryStore, SharedStore, SqliteStore};

use crate::config::Config;

const STORE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atrium=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let (store, backend) = open_store(&config).await;
    let mailer = Mailer::new(config.mail.clone())?;

    let state: AppState = Arc::new(AppStateInner {
        store,
        backend,
        sessions: SessionStore::new(),
        mailer,
        admin_user: config.admin_user.clone(),
        admin_pass: config.admin_pass.clone(),
        session_secret: config.session_secret.clone(),
    });

    let mut app = routes::router(state.clone()).merge(pages::router(state, config.static_dir.clone()));

    // Cookies cross site boundaries only when a frontend origin is configured.
    if let Some(origin) = &config.allowed_origin {
        let cors = CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([ACCEPT, CONTENT_TYPE])
            .allow_credentials(true);
        app = app.layer(cors);
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Atrium server listening on {} ({} store)", addr, backend);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Probe the durable backend under a short timeout; fall back to the
/// in-memory store when it cannot be opened.
async fn open_store(config: &Config) -> (SharedStore, &'static str) {
    let db_path = config.db_path.clone();
    let open = tokio::time::timeout(
        STORE_PROBE_TIMEOUT,
        tokio::task::spawn_blocking(move || SqliteStore::open(&db_path)),
    )
    .await;

    match open {
        Ok(Ok(Ok(store))) => {
            info!("Using durable appointment store at {}", config.db_path.display());
            (Arc::new(store) as SharedStore, "sqlite")
        }
        Ok(Ok(Err(e))) => {
            warn!("Database not available ({e:#}), using in-memory storage");
            (Arc::new(MemoryStore::new()) as SharedStore, "memory")
        }
        Ok(Err(e)) => {
            warn!("Database probe failed ({e}), using in-memory storage");
            (Arc::new(MemoryStore::new()) as SharedStore, "memory")
        }
        Err(_) => {
            warn!(
                "Database probe timed out after {:?}, using in-memory storage",
                STORE_PROBE_TIMEOUT
            );
            (Arc::new(MemoryStore::new()) as SharedStore, "memory")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
