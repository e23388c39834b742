//! Cookie-backed request sessions.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → store.rs load   (verify HMAC, check age; any failure → fresh session)
//!     → Session         (carried in RequestContext, mutated by providers)
//!     → store.rs save   (modified sessions only → Set-Cookie)
//! ```
//!
//! # Design Decisions
//! - All state lives client-side in a signed (not encrypted) cookie
//! - A bad cookie is never an error for the client, it simply starts over
//! - Values are JSON so providers can store whatever shape they need

pub mod store;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub use store::{SessionError, SessionStore};

/// Key-value state attached to one client.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    values: Map<String, Value>,
    is_new: bool,
    modified: bool,
}

impl Session {
    /// An empty session that has not been sent to the client yet.
    pub fn new() -> Self {
        Self {
            values: Map::new(),
            is_new: true,
            modified: false,
        }
    }

    pub(crate) fn restore(values: Map<String, Value>) -> Self {
        Self {
            values,
            is_new: false,
            modified: false,
        }
    }

    /// Read a value, returning `None` when absent or of a different shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.into(), value);
        self.modified = true;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.values.is_empty() {
            self.values.clear();
            self.modified = true;
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when the client did not present a valid session cookie.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// True when the session must be written back to the client.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
