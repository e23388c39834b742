//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Provider → registry.rs register (name rule checked under the lock)
//!     Registry → build_handler (snapshot under the lock)
//!              → naming.rs (Name → url segment)
//!              → one axum route per provider, frozen into a Router
//!
//! Per request:
//!     axum matches /<segment>/... → dispatch engine for that provider
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Prefix matching only, by convention-derived segment
//! - Unknown resources fall through to a plain 404

pub mod naming;
pub mod registry;

pub use naming::to_url_segment;
pub use registry::{HandlerOptions, Registry, RegistryError};
