//! Shared HTTP client construction.

use reqwest::Client as HttpClient;
use std::time::Duration;

/// Default timeout for outbound HTTP calls, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Get the outbound HTTP timeout from env or default.
///
/// Environment variable: `HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_http_timeout_secs() -> u64 {
    std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(HTTP_TIMEOUT_SECS)
}

/// Creates an HTTP client configured with the standard timeout.
///
/// The timeout prevents a slow catalog or image host from hanging a
/// handler indefinitely.
#[must_use]
pub fn create_http_client() -> HttpClient {
    let timeout = Duration::from_secs(get_http_timeout_secs());
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}
