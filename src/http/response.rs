//! Response writing.
//!
//! # Responsibilities
//! - Serialize provider replies as JSON
//! - Attach the session cookie when one was produced
//!
//! # Design Decisions
//! - Status is always 200 for a written reply; failure is carried in the body
//! - Serialization errors are returned to the caller, which treats them as fatal

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use serde::Serialize;

/// Build a `200 application/json` response from any serializable value.
pub fn json_response<T: Serialize + ?Sized>(
    value: &T,
    set_cookie: Option<HeaderValue>,
) -> Result<Response, serde_json::Error> {
    let body = serde_json::to_vec(value)?;

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(cookie) = set_cookie {
        headers.insert(header::SET_COOKIE, cookie);
    }

    Ok(response)
}
