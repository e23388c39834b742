//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile the registry into the resource router
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and serve until shutdown

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::lifecycle::shutdown;
use crate::routing::{HandlerOptions, Registry, RegistryError};

/// HTTP server hosting the providers of one registry.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Snapshot `registry` into a router. Later registrations are not served.
    pub fn new(config: AppConfig, registry: &Registry) -> Result<Self, RegistryError> {
        let handler = registry.build_handler_with(HandlerOptions::from_config(&config))?;
        let router = Self::build_router(&config, handler);
        Ok(Self { router, config })
    }

    /// Wrap the resource routes with the middleware stack.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, handler: Router) -> Router {
        handler
            .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, e.g. for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
