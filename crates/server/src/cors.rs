//! Cross-origin policy shared by both gateway endpoints.
//!
//! The allow-origin decision is made exactly once, at the top of each
//! request, and travels with the response builder so that every reply
//! carries the same headers, including the earliest rejection paths.

use axum::http::header::{HeaderMap, HeaderValue, ORIGIN};
use locker_core::config::CorsConfig;

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Content-Length, Authorization";

/// Resolve the `Access-Control-Allow-Origin` value for a request.
///
/// The caller's origin is echoed back when it matches the policy
/// (exact origin, or a trusted domain suffix); anything else gets the
/// wildcard.
pub fn resolve_allow_origin(origin: Option<&str>, policy: &CorsConfig) -> String {
    if let Some(origin) = origin {
        let exact = policy.allowed_origins.iter().any(|o| o == origin);
        let suffix = policy
            .allowed_suffixes
            .iter()
            .any(|suffix| origin.ends_with(suffix.as_str()));
        if exact || suffix {
            return origin.to_string();
        }
    }
    "*".to_string()
}

/// The CORS headers applied to every response of a request.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
}

impl CorsHeaders {
    /// Resolve the policy for an incoming request's headers.
    pub fn resolve(headers: &HeaderMap, policy: &CorsConfig) -> Self {
        let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
        let allowed = resolve_allow_origin(origin, policy);
        let allow_origin =
            HeaderValue::from_str(&allowed).unwrap_or_else(|_| HeaderValue::from_static("*"));
        Self { allow_origin }
    }

    /// Apply the headers to a response header map.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert("access-control-allow-origin", self.allow_origin.clone());
        headers.insert(
            "access-control-allow-methods",
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            "access-control-allow-headers",
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }
}
