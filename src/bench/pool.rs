//! Fixed-size worker pool over a URL list.
//!
//! `concurrency` workers pull indices from a shared cursor, so each URL is
//! claimed exactly once. Every worker appends `(index, outcome)` to its own
//! buffer; buffers are merged in input order only after all workers have
//! been joined.

use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::executor::TimeoutExecutor;
use super::progress::ProgressCounters;
use super::{BenchError, BenchResult};
use crate::fetcher::FetchStrategy;
use crate::shutdown::SharedShutdown;
use crate::FetchOutcome;

/// Worker pool configuration for one run.
#[derive(Clone)]
pub struct WorkerPool {
    strategy: Arc<dyn FetchStrategy>,
    concurrency: usize,
    timeout: Duration,
    executor: TimeoutExecutor,
    counters: Arc<ProgressCounters>,
    interrupt: Option<SharedShutdown>,
}

impl WorkerPool {
    /// Create a pool with `concurrency` workers (at least one).
    pub fn new(strategy: Arc<dyn FetchStrategy>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            strategy,
            concurrency: concurrency.max(1),
            timeout,
            executor: TimeoutExecutor::new(),
            counters: Arc::new(ProgressCounters::new()),
            interrupt: None,
        }
    }

    /// Use a specific executor (e.g. a custom deadline grace).
    pub fn with_executor(mut self, executor: TimeoutExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Report completions into shared counters.
    pub fn with_counters(mut self, counters: Arc<ProgressCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Stop claiming new URLs once `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: SharedShutdown) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Counters this pool reports into.
    pub fn counters(&self) -> Arc<ProgressCounters> {
        Arc::clone(&self.counters)
    }

    /// Process every URL and return one outcome per attempted URL, in input order.
    ///
    /// Returns only after every worker has finished. Without an interrupt
    /// the result has exactly one outcome per URL.
    ///
    /// # Errors
    /// Returns [`BenchError::WorkerPanicked`] if a worker task dies, since
    /// its buffered outcomes would be lost.
    pub async fn run_all(&self, urls: Vec<String>) -> BenchResult<Vec<FetchOutcome>> {
        let urls: Arc<[String]> = urls.into();
        let cursor = Arc::new(AtomicUsize::new(0));
        let workers = self.concurrency.min(urls.len());

        debug!(
            urls = urls.len(),
            workers,
            timeout_secs = self.timeout.as_secs_f64(),
            "Starting worker pool"
        );

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let urls = Arc::clone(&urls);
                let cursor = Arc::clone(&cursor);
                let strategy = Arc::clone(&self.strategy);
                let counters = Arc::clone(&self.counters);
                let interrupt = self.interrupt.clone();
                let executor = self.executor;
                let timeout = self.timeout;

                tokio::spawn(async move {
                    let mut buffer = Vec::new();
                    loop {
                        if interrupt.as_ref().is_some_and(|s| s.is_shutdown_requested()) {
                            break;
                        }
                        let index = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(url) = urls.get(index) else {
                            break;
                        };
                        let outcome = executor.execute(url, &strategy, timeout).await;
                        counters.record(&outcome);
                        buffer.push((index, outcome));
                    }
                    trace!(worker_id, processed = buffer.len(), "Worker drained");
                    buffer
                })
            })
            .collect();

        let mut merged: Vec<(usize, FetchOutcome)> = Vec::with_capacity(urls.len());
        let mut panicked = None;
        for joined in join_all(handles).await {
            match joined {
                Ok(buffer) => merged.extend(buffer),
                Err(e) => panicked = Some(e.to_string()),
            }
        }
        if let Some(reason) = panicked {
            return Err(BenchError::WorkerPanicked(reason));
        }

        merged.sort_unstable_by_key(|(index, _)| *index);
        if merged.len() < urls.len() {
            warn!(
                attempted = merged.len(),
                skipped = urls.len() - merged.len(),
                "Run interrupted before all URLs were attempted"
            );
        }

        Ok(merged.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

/// Run every URL through `strategy` with `concurrency` workers.
pub async fn run_all(
    urls: Vec<String>,
    strategy: Arc<dyn FetchStrategy>,
    concurrency: usize,
    timeout: Duration,
) -> BenchResult<Vec<FetchOutcome>> {
    WorkerPool::new(strategy, concurrency, timeout).run_all(urls).await
}
