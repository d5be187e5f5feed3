//! Timeout-bounded fetch execution
//!
//! Runs one strategy attempt against one URL and turns whatever happens
//! into a [`FetchOutcome`]. Nothing raised by a strategy (errors, panics,
//! hangs) escapes [`TimeoutExecutor::execute`].
//!
//! Classification is deliberately asymmetric:
//!
//! | raw result                          | outcome                                  |
//! |-------------------------------------|------------------------------------------|
//! | success and `elapsed <= timeout`    | success, `elapsed` unchanged             |
//! | anything else                       | failure, `elapsed = min(elapsed, timeout)` |
//!
//! A success that overran the timeout is reported as a failure.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::config::DEFAULT_DEADLINE_GRACE;
use crate::fetcher::{FetchStrategy, FetcherError};
use crate::{metrics, FetchOutcome, RawOutcome};

/// Classify a raw outcome against the run timeout.
pub fn classify(raw: RawOutcome, timeout: Duration) -> FetchOutcome {
    if raw.success && raw.elapsed <= timeout {
        FetchOutcome::success(raw.elapsed)
    } else {
        FetchOutcome::failure(raw.elapsed.min(timeout))
    }
}

/// Executes single fetch attempts under a hard deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutExecutor {
    deadline_grace: Duration,
}

impl Default for TimeoutExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutExecutor {
    /// Create an executor with the default deadline grace.
    pub fn new() -> Self {
        Self {
            deadline_grace: DEFAULT_DEADLINE_GRACE,
        }
    }

    /// Set how long past the timeout to keep waiting on a strategy.
    pub fn with_deadline_grace(mut self, grace: Duration) -> Self {
        self.deadline_grace = grace;
        self
    }

    /// Run one attempt and classify it.
    ///
    /// The attempt runs on its own task. If it has not returned by
    /// `timeout + deadline_grace` the executor stops waiting and reports a
    /// failure; the task is left to finish on its own so the strategy can
    /// release whatever it holds.
    pub async fn execute(
        &self,
        url: &str,
        strategy: &Arc<dyn FetchStrategy>,
        timeout: Duration,
    ) -> FetchOutcome {
        let start = Instant::now();

        let attempt = tokio::spawn({
            let strategy = Arc::clone(strategy);
            let url = url.to_string();
            async move { strategy.attempt(&url, timeout).await }
        });

        let deadline = timeout.saturating_add(self.deadline_grace);
        let result = match tokio::time::timeout(deadline, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(FetcherError::TaskFailed(join_error.to_string())),
            Err(_) => Err(FetcherError::DeadlineExceeded(start.elapsed())),
        };

        let raw = RawOutcome {
            elapsed: start.elapsed(),
            success: result.is_ok(),
        };
        let outcome = classify(raw, timeout);

        match &result {
            Ok(()) if !outcome.succeeded => debug!(
                url,
                elapsed_ms = raw.elapsed.as_millis(),
                timeout_ms = timeout.as_millis(),
                "Fetch succeeded past the timeout, counted as failure"
            ),
            Ok(()) => trace!(url, elapsed_ms = raw.elapsed.as_millis(), "Fetch succeeded"),
            Err(e) => debug!(url, elapsed_ms = raw.elapsed.as_millis(), error = %e, "Fetch failed"),
        }

        metrics::record_fetch(strategy.mode(), &outcome);
        outcome
    }
}
