//! Fetch strategy implementations
//!
//! A [`FetchStrategy`] performs exactly one fetch attempt for a URL and
//! reports raw success or failure. Timing, deadline enforcement, and
//! classification live in [`crate::bench::executor`]; strategies only
//! need to honor the timeout as their own internal cutoff.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub mod browser;
pub mod http;
pub mod shared_resources;

pub use browser::{BrowserStrategy, ChromeRenderer, PageRenderer, RenderPolicy};
pub use http::HttpStrategy;

/// Fetcher errors
///
/// Every variant is a raw fetch failure; none of them crosses the
/// executor boundary.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP request error (connect, TLS, protocol, client timeout)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response status was not 200
    #[error("unexpected status: {0}")]
    UnexpectedStatus(u16),

    /// Response body was empty
    #[error("empty response body")]
    EmptyBody,

    /// Navigation or content extraction failed
    #[error("render error: {0}")]
    RenderError(String),

    /// Rendered document had no content
    #[error("empty document")]
    EmptyDocument,

    /// Browser could not be launched or configured
    #[error("browser error: {0}")]
    BrowserError(String),

    /// Attempt exceeded the hard deadline
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Attempt task panicked or was cancelled
    #[error("attempt task failed: {0}")]
    TaskFailed(String),
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetcherError>;

/// Strategy variant used for a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Single plain HTTP GET
    Http,
    /// Full browser render
    Chrome,
    /// Browser render with scripts disabled
    ChromeNoJs,
    /// Browser render with image/media/font loads aborted
    ChromeNoMedia,
}

impl FetchMode {
    /// All variants, in CLI order.
    pub const ALL: [FetchMode; 4] = [
        FetchMode::Http,
        FetchMode::Chrome,
        FetchMode::ChromeNoJs,
        FetchMode::ChromeNoMedia,
    ];

    /// CLI name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Chrome => "chrome",
            Self::ChromeNoJs => "chrome-no-js",
            Self::ChromeNoMedia => "chrome-no-media",
        }
    }

    /// Whether the mode renders in a browser.
    pub fn is_browser(&self) -> bool {
        !matches!(self, Self::Http)
    }

    /// Rendering policy for browser modes; `None` for plain HTTP.
    pub fn render_policy(&self) -> Option<RenderPolicy> {
        match self {
            Self::Http => None,
            Self::Chrome => Some(RenderPolicy::full()),
            Self::ChromeNoJs => Some(RenderPolicy::no_script()),
            Self::ChromeNoMedia => Some(RenderPolicy::no_media()),
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                format!("Invalid mode: {s}. Valid options: http, chrome, chrome-no-js, chrome-no-media")
            })
    }
}

/// One way of fetching a URL.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Perform a single fetch attempt.
    ///
    /// `Ok(())` is a raw success; any error is a raw failure. The strategy
    /// should use `timeout` as its own internal cutoff but is not required
    /// to report timeouts distinctly.
    async fn attempt(&self, url: &str, timeout: Duration) -> FetchResult<()>;

    /// Mode this strategy implements
    fn mode(&self) -> FetchMode;
}

/// Setup options for strategy construction
#[derive(Debug, Clone, Default)]
pub struct StrategyOptions {
    /// Chrome/Chromium binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Show the browser window instead of running headless
    pub headful: bool,
}

/// Create the strategy for a mode.
///
/// Browser modes launch one shared browser here, which blocks; call this
/// from a blocking context when inside the async runtime.
///
/// # Errors
/// Returns [`FetcherError::BrowserError`] if the browser cannot be launched.
pub fn create_strategy(
    mode: FetchMode,
    options: &StrategyOptions,
) -> FetchResult<Arc<dyn FetchStrategy>> {
    match mode.render_policy() {
        None => Ok(Arc::new(HttpStrategy::new())),
        Some(policy) => {
            let renderer = ChromeRenderer::launch(options, policy)?;
            Ok(Arc::new(BrowserStrategy::new(mode, Arc::new(renderer), policy)))
        }
    }
}
