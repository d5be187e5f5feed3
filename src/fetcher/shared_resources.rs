//! Shared resources for all fetch strategy instances
//!
//! One HTTP client is shared by every worker so that connection pooling
//! behaves the same regardless of concurrency level. The overall request
//! deadline is set per request from the run timeout.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// HTTP connect timeout (seconds); the per-request timeout still bounds the total
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent sent by the plain HTTP strategy
const USER_AGENT: &str = concat!("fetch-bench/", env!("CARGO_PKG_VERSION"));

/// Global HTTP client shared by all HTTP strategy instances
///
/// reqwest never retries on its own, which keeps every attempt a single
/// request.
pub static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    Arc::new(
        Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!("FATAL: Failed to build HTTP client: {}. Check system TLS configuration.", e);
            }),
    )
});

/// Get the global HTTP client
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}
