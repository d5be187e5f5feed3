//! Benchmark engine
//!
//! Runs one [`BenchmarkRun`](crate::BenchmarkRun) over a URL list and
//! reduces it to a [`RunSummary`].
//!
//! # Overview
//!
//! A run is four cooperating pieces:
//!
//! 1. **Execution**: [`executor::TimeoutExecutor`] runs a single attempt under a deadline and classifies it
//! 2. **Pool**: [`pool::WorkerPool`] drives a fixed number of workers over the list
//! 3. **Monitoring**: [`monitor::ResourceMonitor`] samples host CPU/memory and IO beside the pool
//! 4. **Progress**: [`progress::ProgressReporter`] logs counters on its own timer
//!
//! [`BenchmarkRunner`] wires them together and [`summary::RunSummary::compute`]
//! produces the result.
//!
//! # Quick Start
//!
//! ```no_run
//! use fetch_bench::bench::BenchmarkRunner;
//! use fetch_bench::fetcher::{http::HttpStrategy, FetchMode};
//! use fetch_bench::BenchmarkRun;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let run = BenchmarkRun::new(FetchMode::Http, 8, Duration::from_secs(5));
//! let urls = vec!["https://example.com".to_string()];
//!
//! let summary = BenchmarkRunner::new(Arc::new(HttpStrategy::new()))
//!     .run(&run, urls)
//!     .await?;
//! println!("{}", summary.format_done_line());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Per-URL failures never surface as errors; they become failed outcomes.
//! [`BenchError`] only covers an invalid run configuration and a worker
//! task dying.

pub mod config;
pub mod executor;
pub mod monitor;
pub mod pool;
pub mod progress;
pub mod summary;

pub use executor::TimeoutExecutor;
pub use monitor::{HostMetrics, ResourceMonitor, ResourceUsage, SysinfoMetrics};
pub use pool::{run_all, WorkerPool};
pub use progress::{ProgressCounters, ProgressReporter};
pub use summary::{LatencyStats, RunSummary};

use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::fetcher::FetchStrategy;
use crate::shutdown::SharedShutdown;
use crate::{metrics, BenchmarkRun};
use config::{DEFAULT_PROGRESS_INTERVAL, MAX_CONCURRENCY, SAMPLE_INTERVAL};

/// Benchmark errors
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Run configuration rejected before starting
    #[error("invalid run: {0}")]
    InvalidRun(String),

    /// A worker task died and its outcomes were lost
    #[error("worker task panicked: {0}")]
    WorkerPanicked(String),
}

/// Result type for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

type HostMetricsFactory = Box<dyn Fn() -> Box<dyn HostMetrics> + Send + Sync>;

/// Runs benchmark runs end to end with one strategy.
pub struct BenchmarkRunner {
    strategy: Arc<dyn FetchStrategy>,
    executor: TimeoutExecutor,
    progress_interval: Duration,
    progress_bar: ProgressBar,
    interrupt: Option<SharedShutdown>,
    host_metrics: HostMetricsFactory,
    sample_interval: Duration,
}

impl BenchmarkRunner {
    /// Create a runner with a hidden progress bar and real host metrics.
    pub fn new(strategy: Arc<dyn FetchStrategy>) -> Self {
        Self {
            strategy,
            executor: TimeoutExecutor::new(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress_bar: ProgressBar::hidden(),
            interrupt: None,
            host_metrics: Box::new(|| -> Box<dyn HostMetrics> { Box::new(SysinfoMetrics::new()) }),
            sample_interval: SAMPLE_INTERVAL,
        }
    }

    /// Use a specific executor.
    pub fn with_executor(mut self, executor: TimeoutExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Set the `[PROGRESS]` log cadence.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Drive `bar` while the run is in flight.
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.progress_bar = bar;
        self
    }

    /// Stop claiming URLs once `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: SharedShutdown) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Read host metrics from sources built by `factory`, one per run.
    pub fn with_host_metrics<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn HostMetrics> + Send + Sync + 'static,
    {
        self.host_metrics = Box::new(factory);
        self
    }

    /// Override the resource sampling interval.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Execute `run` over `urls` and summarise it.
    ///
    /// The monitor and reporter are both stopped before the summary is
    /// computed, even if the pool fails.
    pub async fn run(&self, run: &BenchmarkRun, urls: Vec<String>) -> BenchResult<RunSummary> {
        validate(run)?;
        if self.strategy.mode() != run.mode {
            warn!(
                run_mode = %run.mode,
                strategy_mode = %self.strategy.mode(),
                "Strategy mode differs from run mode"
            );
        }

        info!(
            mode = %run.mode_label(),
            concurrency = run.concurrency,
            timeout_secs = run.timeout.as_secs_f64(),
            urls = urls.len(),
            "Starting benchmark run"
        );

        let mut monitor =
            ResourceMonitor::new((self.host_metrics)()).with_interval(self.sample_interval);
        let start = Instant::now();
        monitor.start();

        let counters = Arc::new(ProgressCounters::new());
        let reporter = ProgressReporter::start(
            Arc::clone(&counters),
            monitor.latest(),
            urls.len() as u64,
            self.progress_interval,
            self.progress_bar.clone(),
        );

        let mut pool = WorkerPool::new(Arc::clone(&self.strategy), run.concurrency, run.timeout)
            .with_executor(self.executor)
            .with_counters(counters);
        if let Some(interrupt) = &self.interrupt {
            pool = pool.with_interrupt(Arc::clone(interrupt));
        }
        let outcomes = pool.run_all(urls).await;

        reporter.finish().await;
        let wall_clock = start.elapsed();
        let usage = monitor.stop(wall_clock).await;

        let outcomes = outcomes?;
        let summary = RunSummary::compute(run, &outcomes, wall_clock, usage);
        metrics::record_run(run.mode, &summary);

        info!(
            mode = %summary.mode,
            attempts = summary.attempts,
            success_rate = summary.success_rate,
            wall_clock_secs = summary.wall_clock_secs,
            "Benchmark run complete"
        );
        Ok(summary)
    }
}

fn validate(run: &BenchmarkRun) -> BenchResult<()> {
    if run.concurrency == 0 || run.concurrency > MAX_CONCURRENCY {
        return Err(BenchError::InvalidRun(format!(
            "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
            run.concurrency
        )));
    }
    if run.timeout.is_zero() {
        return Err(BenchError::InvalidRun("timeout must be positive".to_string()));
    }
    Ok(())
}
