//! The provider contract.
//!
//! A provider is a named resource handler. The routing engine only ever
//! talks to this trait; storage, validation and domain logic live behind it.
//!
//! # Data Flow
//! ```text
//! Dispatch Engine
//!     → RequestContext (session, request id)
//!     → FilterSet (GET / PUT / DELETE)
//!     → Payload   (PUT / POST body, decoded on demand)
//!     → Provider::{create, read, update, delete}
//!     → Outcome = Reply (serialized to JSON) | ProviderFault (fatal)
//! ```
//!
//! Domain failures ("Account not found") are ordinary string replies.
//! `ProviderFault` is reserved for conditions that should abort the request.

pub mod context;
pub mod echo;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::filter::FilterSet;

pub use context::RequestContext;
pub use echo::EchoProvider;

/// Result of a provider operation.
pub type Outcome = Result<Reply, ProviderFault>;

/// A pluggable handler for one named resource.
///
/// Operations are synchronous; the dispatch engine runs them off the async
/// executor, so blocking storage calls are acceptable.
pub trait Provider: Send + Sync + 'static {
    /// Stable identifier of the resource.
    ///
    /// Must start with an upper-case letter. `UserAccount` is served under
    /// `/user_accounts/`.
    fn name(&self) -> &str;

    /// `POST /<resource>/`
    fn create(&self, ctx: &mut RequestContext, input: &Payload) -> Outcome;

    /// `GET /<resource>/[id]/[property]`
    fn read(&self, ctx: &mut RequestContext, filters: &FilterSet) -> Outcome;

    /// `PUT /<resource>/[id]`
    fn update(&self, ctx: &mut RequestContext, filters: &FilterSet, input: &Payload) -> Outcome;

    /// `DELETE /<resource>/[id]`
    fn delete(&self, ctx: &mut RequestContext, filters: &FilterSet) -> Outcome;
}

/// The raw request body, decoded into whatever shape the provider asks for.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    body: Bytes,
}

impl Payload {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Deserialize the body as JSON into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// The value a provider hands back; written to the client as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reply(Value);

impl Reply {
    /// A plain string reply, the convention for both status and error messages.
    pub fn message(text: impl Into<String>) -> Self {
        Self(Value::String(text.into()))
    }

    /// Serialize any value into a reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ProviderFault> {
        serde_json::to_value(value)
            .map(Self)
            .map_err(|e| ProviderFault::with_source("reply is not serializable", e))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::message(text)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::message(text)
    }
}

/// An unrecoverable provider failure, e.g. corrupted storage.
///
/// Aborts the request with a 500 and no body.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderFault {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
