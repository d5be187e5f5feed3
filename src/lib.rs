//! # Fetch Bench Library
//!
//! Benchmarks URL-fetch strategies (plain HTTP and headless Chrome under
//! several rendering policies) across concurrency levels and timeout
//! thresholds, reporting success latency percentiles, success rate,
//! throughput, and host resource usage for each run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetch_bench::bench::BenchmarkRunner;
//! use fetch_bench::fetcher::{create_strategy, FetchMode, StrategyOptions};
//! use fetch_bench::urls::load_urls;
//! use fetch_bench::BenchmarkRun;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = load_urls("urls.txt", 1_000)?;
//! let run = BenchmarkRun::new(FetchMode::Http, 16, Duration::from_secs(10));
//! let strategy = create_strategy(run.mode, &StrategyOptions::default())?;
//!
//! let summary = BenchmarkRunner::new(strategy).run(&run, urls).await?;
//! println!("p95 = {:.3}s", summary.p95_success_latency);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`urls`] - URL list loading
//! - [`fetcher`] - Fetch strategies (HTTP, browser policies)
//! - [`bench`] - Timeout-bounded executor, worker pool, resource monitor, aggregation
//! - [`output`] - Persistent CSV summary log
//! - [`shutdown`] - Stop signalling for background tasks and Ctrl+C
//! - [`metrics`] - Prometheus metrics
//! - [`cli`] - Command-line surface

#![warn(missing_docs)]
#![warn(clippy::all)]

use fetcher::FetchMode;
use std::time::Duration;

/// Benchmark engine
pub mod bench;

/// CLI command implementations
pub mod cli;

/// Fetch strategies
pub mod fetcher;

/// Observability metrics
pub mod metrics;

/// Summary log writers
pub mod output;

/// Stop signalling shared across tasks
pub mod shutdown;

/// URL list loading
pub mod urls;

/// Immutable configuration of one benchmark execution.
///
/// A run is identified by (mode, concurrency, timeout); `label` only
/// changes how the mode is written to the summary log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRun {
    /// Fetch strategy variant
    pub mode: FetchMode,
    /// Number of concurrent workers
    pub concurrency: usize,
    /// Per-fetch deadline
    pub timeout: Duration,
    /// Optional prefix for the reported mode name
    pub label: Option<String>,
}

impl BenchmarkRun {
    /// Create a run without a label.
    pub fn new(mode: FetchMode, concurrency: usize, timeout: Duration) -> Self {
        Self {
            mode,
            concurrency,
            timeout,
            label: None,
        }
    }

    /// Attach a label prefix (e.g. the harness name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mode name as written to the summary log, e.g. `chrome-no-js` or `lab-chrome-no-js`.
    pub fn mode_label(&self) -> String {
        match &self.label {
            Some(label) => format!("{label}-{}", self.mode),
            None => self.mode.to_string(),
        }
    }
}

/// Unclassified result of one fetch attempt, straight from a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawOutcome {
    /// Observed wall-clock time of the attempt
    pub elapsed: Duration,
    /// Whether the strategy reported success
    pub success: bool,
}

/// Classified result of one fetch attempt.
///
/// `elapsed` never exceeds the run timeout: successes are only
/// classified as such when they finished within it, and failures are
/// clamped to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOutcome {
    /// Reported duration (clamped for failures)
    pub elapsed: Duration,
    /// Whether the fetch counts as a success
    pub succeeded: bool,
}

impl FetchOutcome {
    /// A successful outcome.
    pub fn success(elapsed: Duration) -> Self {
        Self {
            elapsed,
            succeeded: true,
        }
    }

    /// A failed outcome.
    pub fn failure(elapsed: Duration) -> Self {
        Self {
            elapsed,
            succeeded: false,
        }
    }
}
