//! Cross-origin policy
//!
//! Origins are matched exactly, or against patterns containing `*` such as
//! `https://*.vercel.app`. A `*` matches one or more characters and the
//! pattern must cover the whole origin.

use axum::http::{header, request::Parts, HeaderValue, Method};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Compiled set of allowed origins
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl OriginPolicy {
    pub fn new<S: AsRef<str>>(origins: &[S]) -> Self {
        let mut policy = Self::default();
        for origin in origins {
            let origin = origin.as_ref();
            if !origin.contains('*') {
                policy.exact.push(origin.to_string());
                continue;
            }
            match wildcard_regex(origin) {
                Ok(re) => policy.patterns.push(re),
                Err(e) => warn!("Ignoring CORS origin pattern {}: {}", origin, e),
            }
        }
        policy
    }

    /// Whether a browser at `origin` may read our responses
    pub fn allows(&self, origin: &str) -> bool {
        self.exact.iter().any(|o| o == origin)
            || self.patterns.iter().any(|re| re.is_match(origin))
    }

    /// Build the tower-http layer enforcing this policy
    pub fn into_layer(self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
                origin.to_str().is_ok_and(|o| self.allows(o))
            }))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}

/// Anchored regex for a `*` pattern; literal pieces are escaped
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".+");
    Regex::new(&format!("^{body}$"))
}
