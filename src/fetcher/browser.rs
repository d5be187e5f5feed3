//! Browser-rendered fetch strategies
//!
//! The three browser modes share one [`BrowserStrategy`] and differ only
//! in the [`RenderPolicy`] applied to each page before navigation:
//!
//! - `chrome`: scripts and all subresources allowed
//! - `chrome-no-js`: script execution disabled for the page
//! - `chrome-no-media`: image, media, and font requests failed before transfer
//!
//! Rendering goes through the [`PageRenderer`] collaborator so the engine
//! can be exercised without a real browser. [`ChromeRenderer`] is the
//! production implementation on top of `headless_chrome`.

use async_trait::async_trait;
use headless_chrome::browser::tab::RequestPausedDecision;
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::FailRequest;
use headless_chrome::protocol::cdp::Network::{ErrorReason, ResourceType};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{FetchMode, FetchResult, FetchStrategy, FetcherError, StrategyOptions};

/// Keep the browser connection alive across long, sparse runs.
const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Launch flag that stops image decoding for the no-media policy
const NO_IMAGES_ARG: &str = "--blink-settings=imagesEnabled=false";

/// Per-page rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPolicy {
    /// Allow page scripts to run
    pub scripts_enabled: bool,
    /// Abort image, media, and font loads
    pub block_media: bool,
}

impl RenderPolicy {
    /// Scripts and all resources allowed.
    pub fn full() -> Self {
        Self {
            scripts_enabled: true,
            block_media: false,
        }
    }

    /// Scripts disabled, resources allowed.
    pub fn no_script() -> Self {
        Self {
            scripts_enabled: false,
            block_media: false,
        }
    }

    /// Scripts allowed, image/media/font loads aborted.
    pub fn no_media() -> Self {
        Self {
            scripts_enabled: true,
            block_media: true,
        }
    }
}

/// Browser-control collaborator.
///
/// `render` is blocking. It must release any page it opens before
/// returning, on success and on every error path.
///
/// A render that ignores its timeout is not cancelled. Once
/// [`TimeoutExecutor`](crate::bench::TimeoutExecutor) gives up at
/// `timeout + deadline_grace`, `execute` reports the failure and returns
/// while the render keeps running; its page is released only when `render`
/// itself returns, after the outcome has been recorded.
pub trait PageRenderer: Send + Sync {
    /// Navigate to `url` under `policy` and return the final document content.
    fn render(&self, url: &str, policy: RenderPolicy, timeout: Duration) -> FetchResult<String>;
}

/// Strategy that renders pages in a browser.
pub struct BrowserStrategy {
    mode: FetchMode,
    renderer: Arc<dyn PageRenderer>,
    policy: RenderPolicy,
}

impl BrowserStrategy {
    /// Create a browser strategy.
    pub fn new(mode: FetchMode, renderer: Arc<dyn PageRenderer>, policy: RenderPolicy) -> Self {
        Self {
            mode,
            renderer,
            policy,
        }
    }
}

#[async_trait]
impl FetchStrategy for BrowserStrategy {
    async fn attempt(&self, url: &str, timeout: Duration) -> FetchResult<()> {
        let renderer = Arc::clone(&self.renderer);
        let policy = self.policy;
        let target = url.to_string();

        let html = tokio::task::spawn_blocking(move || renderer.render(&target, policy, timeout))
            .await
            .map_err(|e| FetcherError::TaskFailed(e.to_string()))??;

        debug!(url, bytes = html.len(), mode = %self.mode, "Page rendered");

        if html.is_empty() {
            return Err(FetcherError::EmptyDocument);
        }
        Ok(())
    }

    fn mode(&self) -> FetchMode {
        self.mode
    }
}

/// Closes its tab when dropped, whatever path the render took.
struct TabGuard(Arc<Tab>);

impl Drop for TabGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close(false) {
            debug!("Failed to close tab: {}", e);
        }
    }
}

/// [`PageRenderer`] backed by a shared headless Chrome instance.
pub struct ChromeRenderer {
    browser: Browser,
}

impl ChromeRenderer {
    /// Launch the browser used for the whole run.
    ///
    /// # Errors
    /// Returns [`FetcherError::BrowserError`] if options are invalid or
    /// Chrome cannot be started.
    pub fn launch(options: &StrategyOptions, policy: RenderPolicy) -> FetchResult<Self> {
        let mut args: Vec<&OsStr> = Vec::new();
        if policy.block_media {
            args.push(OsStr::new(NO_IMAGES_ARG));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(!options.headful)
            .path(options.chrome_path.clone())
            .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
            .args(args)
            .build()
            .map_err(|e| FetcherError::BrowserError(format!("Invalid launch options: {e}")))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| FetcherError::BrowserError(format!("Failed to launch browser: {e}")))?;

        info!(
            headless = !options.headful,
            scripts_enabled = policy.scripts_enabled,
            block_media = policy.block_media,
            "Browser launched"
        );
        Ok(Self { browser })
    }

    fn apply_policy(tab: &Tab, policy: RenderPolicy) -> FetchResult<()> {
        if !policy.scripts_enabled {
            tab.call_method(Emulation::SetScriptExecutionDisabled { value: true })
                .map_err(|e| FetcherError::BrowserError(format!("Failed to disable scripts: {e}")))?;
        }

        if policy.block_media {
            tab.enable_fetch(None, None)
                .map_err(|e| FetcherError::BrowserError(format!("Failed to enable fetch: {e}")))?;
            tab.enable_request_interception(Arc::new(
                |_transport: Arc<Transport>, _session_id: SessionId, intercepted: RequestPausedEvent| {
                    match intercepted.params.resource_Type {
                        ResourceType::Image | ResourceType::Media | ResourceType::Font => {
                            RequestPausedDecision::Fail(FailRequest {
                                request_id: intercepted.params.request_id,
                                error_reason: ErrorReason::BlockedByClient,
                            })
                        }
                        _ => RequestPausedDecision::Continue(None),
                    }
                },
            ))
            .map_err(|e| FetcherError::BrowserError(format!("Failed to intercept requests: {e}")))?;
        }
        Ok(())
    }
}

impl PageRenderer for ChromeRenderer {
    fn render(&self, url: &str, policy: RenderPolicy, timeout: Duration) -> FetchResult<String> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| FetcherError::BrowserError(format!("Failed to open tab: {e}")))?;
        let guard = TabGuard(tab);

        guard.0.set_default_timeout(timeout);
        Self::apply_policy(&guard.0, policy)?;

        guard
            .0
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| FetcherError::RenderError(e.to_string()))?;

        guard
            .0
            .get_content()
            .map_err(|e| FetcherError::RenderError(e.to_string()))
    }
}
