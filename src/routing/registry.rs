//! Provider registry and route compilation.
//!
//! # Responsibilities
//! - Own the name → provider mapping
//! - Enforce the provider naming rule at registration
//! - Compile the mapping into an axum `Router`, one route per provider
//!
//! # Design Decisions
//! - One exclusive lock guards every read and write of the mapping
//! - Building captures a snapshot: providers registered afterwards are not
//!   visible to an already-built router
//! - Each route holds its provider directly; no name lookup per request

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::Request;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect};
use axum::routing::any;
use axum::Router;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

use crate::config::{AppConfig, LimitsConfig, SessionConfig};
use crate::http::dispatch::{dispatch, ResourceRoute};
use crate::provider::Provider;
use crate::routing::naming::{is_valid_provider_name, to_url_segment};
use crate::session::{SessionError, SessionStore};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Provider name must start with an upper case letter: {0:?}")]
    InvalidName(String),

    #[error("Provider {name:?} maps to URL segment {segment:?}, which is not a plain path segment")]
    InvalidSegment { name: String, segment: String },

    #[error("Providers {first:?} and {second:?} both map to /{segment}/")]
    RouteConflict {
        segment: String,
        first: String,
        second: String,
    },

    #[error("Cannot build handler: {0}")]
    Session(#[from] SessionError),
}

/// Settings applied to every route built by [`Registry::build_handler_with`].
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    pub session: SessionConfig,
    pub max_body_size: usize,
}

impl HandlerOptions {
    pub fn new(session_secret: impl Into<String>) -> Self {
        Self {
            session: SessionConfig {
                secret: session_secret.into(),
                ..SessionConfig::default()
            },
            max_body_size: LimitsConfig::default().max_body_size,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            session: config.session.clone(),
            max_body_size: config.limits.max_body_size,
        }
    }
}

/// The set of providers served by one HTTP handler.
#[derive(Default)]
pub struct Registry {
    providers: Mutex<HashMap<String, Arc<dyn Provider>>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.names())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, replacing any provider registered under the same name.
    pub fn register<P: Provider>(&self, provider: P) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(provider))
    }

    /// Add a provider that is also referenced elsewhere.
    pub fn register_shared(&self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let mut providers = self.providers.lock().expect("registry mutex poisoned");

        let name = provider.name().to_string();
        if !is_valid_provider_name(&name) {
            tracing::warn!(provider = %name, "Rejected provider with invalid name");
            return Err(RegistryError::InvalidName(name));
        }

        let replaced = providers.insert(name.clone(), provider).is_some();
        tracing::info!(provider = %name, replaced, "Provider added");
        Ok(())
    }

    /// Remove a provider. Returns whether one was registered under `name`.
    pub fn unregister(&self, name: &str) -> bool {
        let mut providers = self.providers.lock().expect("registry mutex poisoned");
        let removed = providers.remove(name).is_some();
        if removed {
            tracing::info!(provider = %name, "Provider removed");
        }
        removed
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let providers = self.providers.lock().expect("registry mutex poisoned");
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers
            .lock()
            .expect("registry mutex poisoned")
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a handler with default options and the given cookie signing secret.
    pub fn build_handler(&self, session_secret: impl Into<String>) -> Result<Router, RegistryError> {
        self.build_handler_with(HandlerOptions::new(session_secret))
    }

    /// Compile the current providers into a router.
    ///
    /// Every provider gets `/<segment>/` and `/<segment>/{*rest}` for all
    /// verbs, plus a redirect from the bare `/<segment>`.
    pub fn build_handler_with(&self, options: HandlerOptions) -> Result<Router, RegistryError> {
        let sessions = Arc::new(SessionStore::new(options.session)?);

        let mut snapshot: Vec<(String, Arc<dyn Provider>)> = {
            let providers = self.providers.lock().expect("registry mutex poisoned");
            providers
                .iter()
                .map(|(name, provider)| (name.clone(), provider.clone()))
                .collect()
        };
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        let mut owners: HashMap<String, String> = HashMap::new();
        let mut router = Router::new();

        for (name, provider) in snapshot {
            let segment = to_url_segment(&name);
            if !is_plain_segment(&segment) {
                return Err(RegistryError::InvalidSegment { name, segment });
            }
            if let Some(first) = owners.get(&segment) {
                return Err(RegistryError::RouteConflict {
                    segment,
                    first: first.clone(),
                    second: name,
                });
            }
            owners.insert(segment.clone(), name.clone());

            let route = Arc::new(ResourceRoute::new(
                name.clone(),
                provider,
                sessions.clone(),
                options.max_body_size,
            ));
            let handler = move |request: Request| {
                let route = route.clone();
                async move { dispatch(route, request).await }
            };

            // Requests arrive percent-encoded; non-ASCII segments must match that form.
            let encoded = utf8_percent_encode(&segment, SEGMENT_ENCODE_SET).to_string();
            let prefix = format!("/{encoded}/");
            let redirect_target = prefix.clone();
            router = router
                .route(&prefix, any(handler.clone()))
                .route(&format!("{prefix}{{*rest}}"), any(handler))
                .route(
                    &format!("/{encoded}"),
                    any(move |uri: Uri| async move { redirect_to_prefix(&redirect_target, &uri) }),
                );

            tracing::debug!(provider = %name, prefix = %prefix, "Route installed");
        }

        tracing::info!(routes = owners.len(), "Handler built");
        Ok(router.fallback(not_found))
    }
}

/// Everything but unreserved characters is escaped in an installed route.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

/// Characters allowed in a segment without clashing with route syntax.
fn is_plain_segment(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '~'))
}

fn redirect_to_prefix(prefix: &str, uri: &Uri) -> Redirect {
    match uri.query() {
        Some(query) => Redirect::permanent(&format!("{prefix}?{query}")),
        None => Redirect::permanent(prefix),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}
