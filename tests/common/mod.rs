//! Shared utilities for integration tests.

use std::net::SocketAddr;

use modelmap::config::AppConfig;
use modelmap::{HttpServer, Registry, Shutdown};
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-test-secret";

/// A running server on an ephemeral port. Stops when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `registry` with default config and a test secret.
pub async fn start_server(registry: &Registry) -> TestServer {
    let mut config = AppConfig::default();
    config.session.secret = SECRET.to_string();
    start_server_with(config, registry).await
}

pub async fn start_server_with(config: AppConfig, registry: &Registry) -> TestServer {
    let server = HttpServer::new(config, registry).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestServer { addr, shutdown }
}

/// Client that does not follow redirects or keep cookies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
