//! pitchhub API server
//!
//! Serves the role-based event enrollment API: organisers run events,
//! startups enroll ideas, and approved investors shortlist them.

use std::sync::Arc;

use anyhow::Result;
use pitchhub_api::{
    api,
    config::{self, StoreBackend},
    db::{Database, EntityStore, MemoryStore},
    identity::{PasswordHasher, TokenService},
    state::AppState,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to PITCHHUB_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting pitchhub API");
    info!(
        listen_addr = %config.listen_addr,
        store = ?config.store,
        dev_mode = config.dev_mode,
        "Configuration loaded"
    );

    let store = build_store(&config).await?;

    let state = AppState::new(
        store,
        TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl),
        PasswordHasher::new(),
    );

    let app = api::create_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Construct the entity store once for the life of the process.
async fn build_store(config: &config::Config) -> Result<Arc<dyn EntityStore>> {
    match config.store {
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => {
                    info!("Database connection established");
                    db
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.run_migrations {
                if let Err(e) = db.run_migrations().await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            Ok(Arc::new(db.entity_store()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
