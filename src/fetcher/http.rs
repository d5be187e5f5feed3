//! Plain HTTP fetch strategy
//!
//! Issues a single GET with no retry. The attempt succeeds only when the
//! response status is exactly 200 and the body is non-empty.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::shared_resources::global_http_client;
use super::{FetchMode, FetchResult, FetchStrategy, FetcherError};

/// Single-request HTTP strategy
pub struct HttpStrategy {
    client: Arc<Client>,
}

impl HttpStrategy {
    /// Create a strategy backed by the global client.
    pub fn new() -> Self {
        Self::with_client(global_http_client())
    }

    /// Create a strategy backed by a specific client.
    pub fn with_client(client: Arc<Client>) -> Self {
        Self { client }
    }
}

impl Default for HttpStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    async fn attempt(&self, url: &str, timeout: Duration) -> FetchResult<()> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetcherError::HttpError(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetcherError::UnexpectedStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetcherError::HttpError(e.to_string()))?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "HTTP response received");

        if body.is_empty() {
            return Err(FetcherError::EmptyBody);
        }
        Ok(())
    }

    fn mode(&self) -> FetchMode {
        FetchMode::Http
    }
}
