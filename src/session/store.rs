//! Signed cookie encoding.
//!
//! Cookie value layout:
//! ```text
//! base64url(json values) "." issued_at "." base64url(HMAC-SHA256(name "." payload "." issued_at))
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::header::{self, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::session::Session;

type HmacSha256 = Hmac<Sha256>;

/// Browsers drop cookies larger than this.
const MAX_COOKIE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session secret must not be empty")]
    EmptySecret,

    #[error("malformed session cookie")]
    Malformed,

    #[error("session cookie signature mismatch")]
    BadSignature,

    #[error("session cookie expired")]
    Expired,

    #[error("session payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("encoded session is {0} bytes, over the 4096 byte cookie limit")]
    TooLarge(usize),

    #[error("invalid Set-Cookie header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// Loads and saves sessions as HMAC-signed cookies.
pub struct SessionStore {
    key: Vec<u8>,
    config: SessionConfig,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.config.cookie_name)
            .field("max_age_secs", &self.config.max_age_secs)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        if config.secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }
        Ok(Self {
            key: config.secret.as_bytes().to_vec(),
            config,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Resolve the session presented by the request.
    ///
    /// Missing or invalid cookies yield a fresh, empty session.
    pub fn load(&self, headers: &HeaderMap) -> Session {
        let Some(raw) = find_cookie(headers, &self.config.cookie_name) else {
            return Session::new();
        };

        match self.decode(raw, unix_now()) {
            Ok(values) => Session::restore(values),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding session cookie");
                Session::new()
            }
        }
    }

    /// Produce the `Set-Cookie` value for a session, if it needs one.
    pub fn save(&self, session: &Session) -> Result<Option<HeaderValue>, SessionError> {
        if !session.is_modified() {
            return Ok(None);
        }

        let value = self.encode(session.values(), unix_now())?;
        let header = HeaderValue::from_str(&self.set_cookie(&value))?;
        Ok(Some(header))
    }

    fn encode(&self, values: &Map<String, Value>, issued_at: u64) -> Result<String, SessionError> {
        let payload = BASE64.encode(serde_json::to_vec(values)?);
        let signature = BASE64.encode(self.mac(&payload, issued_at).finalize().into_bytes());

        let encoded = format!("{payload}.{issued_at}.{signature}");
        if encoded.len() > MAX_COOKIE_LEN {
            return Err(SessionError::TooLarge(encoded.len()));
        }
        Ok(encoded)
    }

    fn decode(&self, raw: &str, now: u64) -> Result<Map<String, Value>, SessionError> {
        let mut parts = raw.splitn(3, '.');
        let (Some(payload), Some(issued_at), Some(signature)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(SessionError::Malformed);
        };

        let issued_at: u64 = issued_at.parse().map_err(|_| SessionError::Malformed)?;
        let signature = BASE64.decode(signature).map_err(|_| SessionError::Malformed)?;

        self.mac(payload, issued_at)
            .verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        if now.saturating_sub(issued_at) > self.config.max_age_secs {
            return Err(SessionError::Expired);
        }

        let json = BASE64.decode(payload).map_err(|_| SessionError::Malformed)?;
        Ok(serde_json::from_slice(&json)?)
    }

    fn mac(&self, payload: &str, issued_at: u64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can accept any key length");
        mac.update(self.config.cookie_name.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.update(b".");
        mac.update(issued_at.to_string().as_bytes());
        mac
    }

    fn set_cookie(&self, value: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}",
            self.config.cookie_name, value, self.config.path, self.config.max_age_secs
        );
        if self.config.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");
        cookie
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
