use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;

/// Server configuration, read from the command line or the environment.
///
/// Connection details live here rather than in code so no credential is
/// compiled into the binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Student record management service", long_about = None)]
pub struct AppConfig {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:students.db")]
    pub database_url: String,

    /// Maximum number of pooled database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Host address to bind to
    #[arg(long, env = "STUDENT_REGISTRY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "STUDENT_REGISTRY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Origin allowed to make cross-origin requests (no CORS layer when unset)
    #[arg(long, env = "STUDENT_REGISTRY_CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}

impl AppConfig {
    /// Socket address the server listens on
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn cors_origin(&self) -> Result<Option<HeaderValue>> {
        self.cors_origin
            .as_deref()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", origin))
            })
            .transpose()
    }
}
