//! CORS negotiation for browser calls against the gateway.
//!
//! Computes `Access-Control-*` headers from a fixed origin allow-list and
//! short-circuits `OPTIONS` preflight requests. Every response the gateway
//! produces, success or error, carries these headers so that browser-side
//! error handling can still read the body.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Client-Info, Apikey";
const MAX_AGE: &str = "86400";

/// Fixed origin allow-list, defined at process start and never mutated.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://takeyourtoken.app".to_string(),
                "https://www.takeyourtoken.app".to_string(),
                "https://tyt.foundation".to_string(),
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl CorsPolicy {
    /// Creates a policy with a custom allow-list.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// Computes response headers for the given `Origin` header value.
    ///
    /// An allow-listed origin is echoed back verbatim; anything else,
    /// including a missing origin, gets the wildcard. Pure and infallible.
    pub fn headers(&self, origin: Option<&str>) -> HeaderMap {
        let allow_origin = match origin {
            Some(o) if self.allowed_origins.iter().any(|a| a == o) => o,
            _ => "*",
        };

        let mut headers = HeaderMap::new();
        insert(&mut headers, "access-control-allow-origin", allow_origin);
        insert(&mut headers, "access-control-allow-methods", ALLOW_METHODS);
        insert(&mut headers, "access-control-allow-headers", ALLOW_HEADERS);
        insert(&mut headers, "access-control-max-age", MAX_AGE);
        headers
    }

    /// Answers an `OPTIONS` preflight directly with 204 and the computed
    /// headers. Returns `None` for any other method, signaling the caller to
    /// continue normal processing.
    pub fn preflight(&self, method: &Method, origin: Option<&str>) -> Option<Response> {
        if method != Method::OPTIONS {
            return None;
        }
        let headers = self.headers(origin);
        Some((StatusCode::NO_CONTENT, headers).into_response())
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    // Static names and origin strings from HTTP headers are always valid
    // header values; fall back to the wildcard if a hostile origin is not.
    let value = HeaderValue::from_str(value)
        .unwrap_or_else(|_| HeaderValue::from_static("*"));
    headers.insert(HeaderName::from_static(name), value);
}
