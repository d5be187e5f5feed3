//! Out-of-band progress reporting for benchmark runs.
//!
//! Workers bump atomic counters and append successful latencies to a
//! shared log. A separate reporter task reads snapshots of those on its own
//! timer, drives the progress bar, and periodically logs a `[PROGRESS]`
//! line with counts, completion rate, ETA, running success latency and the
//! latest host sample. The reporter never touches the pool's outcome
//! buffers.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::monitor::{LatestSample, ResourceSample};
use super::summary::{median, percentile_nearest_rank, LatencyStats};
use crate::shutdown::{ShutdownCoordinator, SharedShutdown};
use crate::FetchOutcome;

/// How often the progress bar position is refreshed.
const BAR_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Completion counters shared between workers and the reporter.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    success_micros: AtomicU64,
    success_latencies: Mutex<Vec<f64>>,
}

impl ProgressCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished attempt.
    pub fn record(&self, outcome: &FetchOutcome) {
        if outcome.succeeded {
            self.success_latencies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(outcome.elapsed.as_secs_f64());
            let micros = u64::try_from(outcome.elapsed.as_micros()).unwrap_or(u64::MAX);
            self.success_micros.fetch_add(micros, Ordering::Relaxed);
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Read-only copy of the current counts and running success latency.
    ///
    /// Percentiles are computed over a copy of the latency log, so workers
    /// only ever wait for the copy, never for the sort.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let success_micros = self.success_micros.load(Ordering::Relaxed);

        let mut sorted = self
            .success_latencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sorted.sort_by(f64::total_cmp);

        let latency = if succeeded == 0 || sorted.is_empty() {
            LatencyStats::default()
        } else {
            LatencyStats {
                avg: success_micros as f64 / 1_000_000.0 / succeeded as f64,
                p50: median(&sorted),
                p95: percentile_nearest_rank(&sorted, 0.95),
            }
        };

        ProgressSnapshot {
            succeeded,
            failed,
            latency,
        }
    }
}

/// Point-in-time copy of [`ProgressCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Successful attempts so far
    pub succeeded: u64,
    /// Failed attempts so far
    pub failed: u64,
    /// Running latency over successes so far (s)
    pub latency: LatencyStats,
}

impl ProgressSnapshot {
    /// Attempts finished so far.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Running success rate; 0 before anything finished.
    pub fn success_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.0,
            done => self.succeeded as f64 / done as f64,
        }
    }
}

/// Rate and ETA bookkeeping for one run.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// URLs in the run
    pub total: u64,
    /// Latest counters
    pub latest: ProgressSnapshot,
    /// When the run started
    pub start_time: Instant,
    /// Completion rate (URLs per second)
    pub current_rate: f64,
    /// Most recent host sample, if the monitor has taken one
    pub host: Option<ResourceSample>,
}

impl ProgressState {
    /// Create state for a run over `total` URLs.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            latest: ProgressSnapshot::default(),
            start_time: Instant::now(),
            current_rate: 0.0,
            host: None,
        }
    }

    /// Fold in a new snapshot.
    pub fn update(&mut self, snapshot: ProgressSnapshot) {
        self.latest = snapshot;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.current_rate = snapshot.completed() as f64 / elapsed;
        }
    }

    /// Completion percentage (0-100).
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.latest.completed() as f64 / self.total as f64) * 100.0
    }

    /// Estimated time until every URL has finished.
    pub fn estimate_remaining(&self) -> Option<Duration> {
        let remaining = self.total.saturating_sub(self.latest.completed());
        if remaining == 0 || self.current_rate <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining as f64 / self.current_rate))
    }

    /// Human-readable progress line for logging.
    pub fn format_progress(&self) -> String {
        let mut parts = vec![format!(
            "[PROGRESS] S={} F={} SR={:.3} | {}/{} ({:.1}%)",
            self.latest.succeeded,
            self.latest.failed,
            self.latest.success_rate(),
            self.latest.completed(),
            self.total,
            self.percentage()
        )];

        if self.current_rate > 0.0 {
            parts.push(format!("at {:.2} urls/sec", self.current_rate));
        }

        if let Some(remaining) = self.estimate_remaining() {
            parts.push(format!("- ~{} remaining", format_duration(remaining)));
        }

        let latency = self.latest.latency;
        parts.push(format!(
            "| avg_succ={:.2}s p50={:.2}s p95={:.2}s",
            latency.avg, latency.p50, latency.p95
        ));

        if let Some(host) = self.host {
            parts.push(format!(
                "| CPU={:.1}% Mem={:.1}MB",
                host.cpu_percent, host.memory_mb
            ));
        }

        parts.join(" ")
    }
}

/// Background task that reports progress until stopped.
pub struct ProgressReporter {
    stop: SharedShutdown,
    handle: JoinHandle<ProgressState>,
}

impl ProgressReporter {
    /// Spawn the reporter.
    ///
    /// `log_interval` controls the `[PROGRESS]` log cadence; the bar is
    /// refreshed more often. `host` is read on every refresh.
    pub fn start(
        counters: Arc<ProgressCounters>,
        host: Arc<LatestSample>,
        total: u64,
        log_interval: Duration,
        bar: ProgressBar,
    ) -> Self {
        let stop = ShutdownCoordinator::shared();
        bar.set_length(total);

        let handle = tokio::spawn({
            let stop = stop.clone();
            async move {
                let mut state = ProgressState::new(total);
                let mut ticker = tokio::time::interval(BAR_REFRESH_INTERVAL);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut last_log = Instant::now();

                loop {
                    tokio::select! {
                        _ = stop.wait_for_shutdown() => break,
                        _ = ticker.tick() => {
                            state.update(counters.snapshot());
                            state.host = host.get();
                            bar.set_position(state.latest.completed());
                            bar.set_message(format!("SR={:.3}", state.latest.success_rate()));

                            if last_log.elapsed() >= log_interval {
                                info!("{}", state.format_progress());
                                last_log = Instant::now();
                            }
                        }
                    }
                }

                state.update(counters.snapshot());
                state.host = host.get();
                bar.set_position(state.latest.completed());
                bar.finish_and_clear();
                debug!("Progress reporter stopped");
                state
            }
        });

        Self { stop, handle }
    }

    /// Stop the reporter and return the final progress state.
    pub async fn finish(self) -> Option<ProgressState> {
        self.stop.request_shutdown();
        self.handle.await.ok()
    }
}

/// Styled progress bar for interactive runs.
pub fn create_progress_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {prefix} {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_prefix(label.to_string());
    pb
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
