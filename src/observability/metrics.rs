//! Metrics collection and exposition.
//!
//! # Metrics
//! - `modelmap_requests_total` (counter): requests by resource, method, outcome
//! - `modelmap_request_duration_seconds` (histogram): dispatch latency by resource, method
//!
//! # Design Decisions
//! - Labels are the provider name, not the URL, to keep cardinality bounded
//! - Methods outside GET/PUT/POST/DELETE share the `other` label
//! - Exporter is optional; without it the macros record nothing

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Provider called and reply written.
    Ok,
    /// Explicit filter expression rejected.
    FilterError,
    /// Aborted with a 500.
    Fatal,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Ok => "ok",
            RequestOutcome::FilterError => "filter_error",
            RequestOutcome::Fatal => "fatal",
        }
    }
}

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Bounded `method` label. Extension methods all collapse into `other`.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::PUT => "PUT",
        Method::POST => "POST",
        Method::DELETE => "DELETE",
        _ => "other",
    }
}

pub fn record_request(resource: &str, method: &Method, outcome: RequestOutcome, start_time: Instant) {
    let method = method_label(method);

    ::metrics::counter!(
        "modelmap_requests_total",
        "resource" => resource.to_string(),
        "method" => method,
        "outcome" => outcome.as_str()
    )
    .increment(1);

    ::metrics::histogram!(
        "modelmap_request_duration_seconds",
        "resource" => resource.to_string(),
        "method" => method
    )
    .record(start_time.elapsed().as_secs_f64());
}
