use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod repository;
mod rest;
mod validation;

use config::AppConfig;
use db::DbConnection;
use domain::StudentService;
use rest::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();

    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Setting up database");
    let db = DbConnection::new(&config.database_url, config.max_connections).await?;

    info!("Setting up application state");
    let state = AppState::new(StudentService::new(db));
    let app = create_router(state, config.cors_origin()?);

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for ctrl_c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down server...");
}
