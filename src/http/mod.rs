//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware: request id, trace, timeout)
//!     → per-resource route installed by the Registry
//!     → dispatch.rs (context, filters, body, provider call, session save)
//!     → response.rs (JSON body, content type, Set-Cookie)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod response;
pub mod server;

pub use dispatch::{DispatchError, Operation};
pub use server::HttpServer;
