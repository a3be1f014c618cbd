//! Lexis Server
//!
//! HTTP surface for the string analyzer: analyze and store strings, look them
//! up, list them by structured filters or by a plain English query, and
//! delete them.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use lexis_store::{SqliteStore, StoreError};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Open the store named in the configuration and wrap it as shared state
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    config.validate()?;
    let store = SqliteStore::new(&config.database_path)?;
    Ok(AppState::new(store))
}

/// Start the HTTP server
///
/// Opens the store, builds the router and serves until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Lexis server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
