//! Convention-based HTTP dispatch to pluggable resource providers.
//!
//! Register [`Provider`]s with a [`Registry`], build the handler, and every
//! provider named `Thing` is served CRUD-style under `/things/`:
//!
//! ```text
//! GET    /things/[id]/[property]?filter=<expr>  → Provider::read
//! POST   /things/                               → Provider::create
//! PUT    /things/[id]?filter=<expr>             → Provider::update
//! DELETE /things/[id]?filter=<expr>             → Provider::delete
//! ```

pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod routing;
pub mod session;

pub use config::AppConfig;
pub use filter::{CompareType, FilterRule, FilterSet};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use provider::{Outcome, Payload, Provider, ProviderFault, Reply, RequestContext};
pub use routing::{Registry, RegistryError};
pub use session::Session;
