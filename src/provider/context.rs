//! Per-request context handed to providers.

use crate::session::Session;

/// Ambient state of the request being served.
///
/// Built by the dispatch engine before filters are parsed and dropped when
/// the response is written. Providers may mutate the session; a modified
/// session is written back to the client as a cookie.
#[derive(Debug, Clone)]
pub struct RequestContext {
    session: Session,
    request_id: String,
    resource: String,
}

impl RequestContext {
    pub fn new(session: Session, request_id: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            session,
            request_id: request_id.into(),
            resource: resource.into(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Correlation id, taken from `x-request-id`.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Name of the provider serving this request.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}
