//! Per-request dispatch to a provider.
//!
//! # Responsibilities
//! - Build the request context (session, request id)
//! - Run the implicit and explicit filter passes
//! - Read the body for `PUT`/`POST`
//! - Call the provider operation selected by the HTTP verb
//! - Save the session and write the JSON reply
//!
//! # Design Decisions
//! - A filter syntax error is answered with 200 and a JSON string body;
//!   the provider is not called and the session is not saved
//! - Everything else that goes wrong is fatal for the request: logged,
//!   answered with an empty 500, never retried
//! - Providers are synchronous and run on the blocking pool

use std::sync::Arc;
use std::time::Instant;

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::task::JoinError;
use url::form_urlencoded;
use uuid::Uuid;

use crate::filter::{parse_explicit, parse_implicit, FilterSet};
use crate::http::response::json_response;
use crate::observability::metrics::{self, RequestOutcome};
use crate::provider::{Payload, Provider, ProviderFault, Reply, RequestContext};
use crate::session::SessionStore;

/// Query parameter carrying the explicit filter expression.
pub const FILTER_PARAM: &str = "filter";

/// Provider operation selected by the request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// `GET`→Read, `PUT`→Update, `POST`→Create, `DELETE`→Delete.
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Operation::Read),
            Method::PUT => Some(Operation::Update),
            Method::POST => Some(Operation::Create),
            Method::DELETE => Some(Operation::Delete),
            _ => None,
        }
    }

    fn reads_body(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }
}

/// Conditions that abort a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported HTTP method {0}")]
    UnsupportedMethod(Method),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("provider fault: {0}")]
    Fault(#[from] ProviderFault),

    #[error("provider panicked: {0}")]
    Panicked(#[source] JoinError),

    #[error("failed to serialize reply: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Everything a route needs to serve one resource, captured at build time.
pub struct ResourceRoute {
    name: String,
    provider: Arc<dyn Provider>,
    sessions: Arc<SessionStore>,
    max_body_size: usize,
}

impl ResourceRoute {
    pub fn new(
        name: String,
        provider: Arc<dyn Provider>,
        sessions: Arc<SessionStore>,
        max_body_size: usize,
    ) -> Self {
        Self {
            name,
            provider,
            sessions,
            max_body_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Serve one request for `route`.
pub async fn dispatch(route: Arc<ResourceRoute>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::debug!(
        request_id = %request_id,
        resource = %route.name,
        method = %method,
        path = %request.uri().path(),
        "Dispatching request"
    );

    match serve(&route, request, &request_id).await {
        Ok((response, outcome)) => {
            metrics::record_request(&route.name, &method, outcome, start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                resource = %route.name,
                method = %method,
                error = %e,
                "Request aborted"
            );
            metrics::record_request(&route.name, &method, RequestOutcome::Fatal, start_time);
            e.into_response()
        }
    }
}

async fn serve(
    route: &ResourceRoute,
    request: Request,
    request_id: &str,
) -> Result<(Response, RequestOutcome), DispatchError> {
    let (parts, body) = request.into_parts();

    // 1-2. Filters and context
    let mut filters = FilterSet::new();
    let session = route.sessions.load(&parts.headers);
    let ctx = RequestContext::new(session, request_id, route.name.clone());

    // 3. Implicit then explicit filters
    parse_implicit(&mut filters, parts.uri.path());
    if let Err(e) = parse_explicit(&mut filters, &filter_expression(&parts.uri)) {
        tracing::debug!(request_id = %request_id, resource = %route.name, error = ?e, "Rejected filter expression");
        let response = json_response(&Reply::message(e.to_string()), None)?;
        return Ok((response, RequestOutcome::FilterError));
    }

    let operation = Operation::from_method(&parts.method)
        .ok_or_else(|| DispatchError::UnsupportedMethod(parts.method.clone()))?;

    // 4. Body
    let payload = if operation.reads_body() {
        let bytes = to_bytes(body, route.max_body_size)
            .await
            .map_err(DispatchError::Body)?;
        Payload::new(bytes)
    } else {
        Payload::default()
    };

    // 5. Provider call
    let provider = route.provider.clone();
    let (outcome, ctx) = tokio::task::spawn_blocking(move || {
        let mut ctx = ctx;
        let outcome = match operation {
            Operation::Read => provider.read(&mut ctx, &filters),
            Operation::Update => provider.update(&mut ctx, &filters, &payload),
            Operation::Create => provider.create(&mut ctx, &payload),
            Operation::Delete => provider.delete(&mut ctx, &filters),
        };
        (outcome, ctx)
    })
    .await
    .map_err(DispatchError::Panicked)?;
    let reply = outcome?;

    // 6. Session
    let set_cookie = match route.sessions.save(ctx.session()) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::warn!(request_id = %request_id, resource = %route.name, error = %e, "Failed to save session");
            None
        }
    };

    // 7. Reply
    let response = json_response(&reply, set_cookie)?;
    Ok((response, RequestOutcome::Ok))
}

/// First `filter` query parameter, form-decoded. Empty when absent.
fn filter_expression(uri: &Uri) -> String {
    uri.query()
        .and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == FILTER_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{EchoProvider, Outcome};
    use crate::routing::Registry;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const SECRET: &str = "dispatch-test-secret";

    /// Counts calls per operation.
    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
    }

    impl Provider for Arc<Recorder> {
        fn name(&self) -> &str {
            "Recorder"
        }

        fn create(&self, _ctx: &mut RequestContext, _input: &Payload) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Reply::message("created"))
        }

        fn read(&self, _ctx: &mut RequestContext, _filters: &FilterSet) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderFault::new("storage corrupted"))
        }

        fn update(&self, _ctx: &mut RequestContext, _filters: &FilterSet, _input: &Payload) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Reply::message("updated"))
        }

        fn delete(&self, _ctx: &mut RequestContext, _filters: &FilterSet) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("delete exploded");
        }
    }

    fn echo_router() -> axum::Router {
        let registry = Registry::new();
        registry.register(EchoProvider).unwrap();
        registry.build_handler(SECRET).unwrap()
    }

    async fn send(router: axum::Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_operation_from_method() {
        assert_eq!(Operation::from_method(&Method::GET), Some(Operation::Read));
        assert_eq!(Operation::from_method(&Method::POST), Some(Operation::Create));
        assert_eq!(Operation::from_method(&Method::PATCH), None);
        assert!(Operation::Update.reads_body());
        assert!(!Operation::Delete.reads_body());
    }

    #[test]
    fn test_filter_expression_decoding() {
        let uri: Uri = "/echos/?filter=name%2Ceq%2Ca+b&filter=ignored".parse().unwrap();
        assert_eq!(filter_expression(&uri), "name,eq,a b");

        let uri: Uri = "/echos/".parse().unwrap();
        assert_eq!(filter_expression(&uri), "");
    }

    #[tokio::test]
    async fn test_read_returns_filters() {
        let (status, body) = send(echo_router(), Method::GET, "/echos/10/color?filter=a,gt,5", "").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["id"]["Value"], "10");
        assert_eq!(value["property"]["Value"], "color");
        assert_eq!(value["a"]["CompareType"], 3);
    }

    #[tokio::test]
    async fn test_json_content_type() {
        let request = Request::builder().uri("/echos/").body(Body::empty()).unwrap();
        let response = echo_router().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_filter_error_skips_provider() {
        let recorder = Arc::new(Recorder::default());
        let registry = Registry::new();
        registry.register(recorder.clone()).unwrap();
        let router = registry.build_handler(SECRET).unwrap();

        let (status, body) = send(router, Method::PUT, "/recorders/?filter=bad", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "\"Expecting exactly 3 operands for filter rule\"");
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_fatal() {
        let recorder = Arc::new(Recorder::default());
        let registry = Registry::new();
        registry.register(recorder.clone()).unwrap();
        let router = registry.build_handler(SECRET).unwrap();

        let (status, body) = send(router, Method::PATCH, "/recorders/1", "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_fault_and_panic_are_fatal() {
        let recorder = Arc::new(Recorder::default());
        let registry = Registry::new();
        registry.register(recorder.clone()).unwrap();
        let router = registry.build_handler(SECRET).unwrap();

        let (status, _) = send(router.clone(), Method::GET, "/recorders/1", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(router.clone(), Method::DELETE, "/recorders/1", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // The router keeps serving after a provider panic.
        let (status, body) = send(router, Method::POST, "/recorders/", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "\"created\"");
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_fatal() {
        let registry = Registry::new();
        registry.register(EchoProvider).unwrap();
        let mut options = crate::routing::HandlerOptions::new(SECRET);
        options.max_body_size = 8;
        let router = registry.build_handler_with(options).unwrap();

        let (status, _) = send(router, Method::POST, "/echos/", r#"{"name":"far too long"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bare_segment_redirects() {
        let request = Request::builder().uri("/echos?filter=a,eq,1").body(Body::empty()).unwrap();
        let response = echo_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/echos/?filter=a,eq,1"
        );
    }

    #[tokio::test]
    async fn test_unknown_resource_is_404() {
        let (status, body) = send(echo_router(), Method::GET, "/users/1", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 page not found");
    }

    #[tokio::test]
    async fn test_routes_are_a_snapshot() {
        let registry = Registry::new();
        registry.register(EchoProvider).unwrap();
        let router = registry.build_handler(SECRET).unwrap();

        registry.register(Arc::new(Recorder::default())).unwrap();
        registry.unregister(EchoProvider::NAME);

        let (status, _) = send(router.clone(), Method::GET, "/recorders/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(router, Method::GET, "/echos/", "").await;
        assert_eq!(status, StatusCode::OK);
    }
}
