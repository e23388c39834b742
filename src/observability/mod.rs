//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry and dispatch engine produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every dispatch event
//! - Metrics calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
