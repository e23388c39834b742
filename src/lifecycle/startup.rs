//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the registry into the HTTP handler
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until a shutdown signal

use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::schema::DEFAULT_SESSION_SECRET;
use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{Registry, RegistryError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build handler: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[source] AddrParseError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serve every provider in `registry` until SIGINT/SIGTERM.
pub async fn serve(config: AppConfig, registry: &Registry) -> Result<(), StartupError> {
    if config.session.secret == DEFAULT_SESSION_SECRET {
        tracing::warn!("session.secret is the built-in placeholder; set MODELMAP_SESSION_SECRET");
    }

    let server = HttpServer::new(config, registry)?;
    let config = server.config();

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(StartupError::MetricsAddress)?;
        metrics::init_metrics(addr)?;
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
