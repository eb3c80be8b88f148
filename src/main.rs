//! # Todo API Server
//!
//! Entry point: logging, configuration, storage, session store, then the
//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use todo_api::{config::Config, db, state::AppState};
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired session rows are purged.
const SESSION_CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: info for dependencies, debug for this crate.
    // Override with RUST_LOG.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    // Users and todos, schema migrated on start
    let pool = db::connect(&config.database_url).await?;

    // Sessions share the database but keep their own table
    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    // Expired sessions are never served (load checks expiry) but their rows
    // linger until this task removes them
    let cleanup_store = session_store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            tracing::debug!("Running expired session cleanup");
            if let Err(e) = cleanup_store.delete_expired().await {
                tracing::error!("Session cleanup failed: {:?}", e);
            }
        }
    });

    let bind_addr = config.bind_address();
    let state = AppState::new(config, pool, Arc::new(session_store));
    let app = todo_api::app(state);

    tracing::info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    // Connect info feeds the peer address into the request log span
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
