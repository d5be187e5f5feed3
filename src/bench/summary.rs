//! Aggregation of per-URL outcomes into a run summary.

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

use super::monitor::ResourceUsage;
use crate::{BenchmarkRun, FetchOutcome};

/// Latency statistics over successful fetches, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Mean
    pub avg: f64,
    /// Median
    pub p50: f64,
    /// 95th percentile (nearest rank)
    pub p95: f64,
}

impl LatencyStats {
    /// Compute stats over the successful outcomes. All zero when none succeeded.
    pub fn from_outcomes(outcomes: &[FetchOutcome]) -> Self {
        let mut latencies: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.elapsed.as_secs_f64())
            .collect();
        if latencies.is_empty() {
            return Self::default();
        }
        latencies.sort_by(f64::total_cmp);

        let avg = latencies.iter().sum::<f64>() / latencies.len() as f64;
        Self {
            avg,
            p50: median(&latencies),
            p95: percentile_nearest_rank(&latencies, 0.95),
        }
    }
}

/// Median of an ascending slice; the mean of the two middle values for an
/// even length. 0 for an empty slice.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Nearest-rank percentile of an ascending slice: the value at
/// `ceil(q * n) - 1`, clamped into range. 0 for an empty slice.
pub fn percentile_nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

/// Aggregate result of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Mode name, with the run label prefix if any
    pub mode: String,
    /// Worker count
    pub concurrency: usize,
    /// Per-fetch timeout in seconds
    pub timeout: f64,
    /// Mean successful latency (s)
    pub avg_success_latency: f64,
    /// Median successful latency (s)
    pub p50_success_latency: f64,
    /// 95th percentile successful latency (s)
    pub p95_success_latency: f64,
    /// Successes / attempts
    pub success_rate: f64,
    /// Successes per wall-clock second
    pub throughput: f64,
    /// Mean CPU utilisation (%)
    pub avg_cpu: f64,
    /// Mean used memory (MB)
    pub avg_mem: f64,
    /// Disk read rate (MB/s)
    pub disk_io_rate: f64,
    /// Network rate (MB/s)
    pub net_io_rate: f64,
    /// URLs attempted
    pub attempts: usize,
    /// Successful attempts
    pub successes: usize,
    /// Wall-clock duration of the run (s)
    pub wall_clock_secs: f64,
    /// When the summary was computed (RFC3339)
    pub timestamp: String,
}

impl RunSummary {
    /// Build a summary from the run's outcomes, wall time and resource usage.
    pub fn compute(
        run: &BenchmarkRun,
        outcomes: &[FetchOutcome],
        wall_clock: Duration,
        usage: ResourceUsage,
    ) -> Self {
        let attempts = outcomes.len();
        let successes = outcomes.iter().filter(|o| o.succeeded).count();
        let latency = LatencyStats::from_outcomes(outcomes);

        Self {
            mode: run.mode_label(),
            concurrency: run.concurrency,
            timeout: run.timeout.as_secs_f64(),
            avg_success_latency: latency.avg,
            p50_success_latency: latency.p50,
            p95_success_latency: latency.p95,
            success_rate: success_rate(successes, attempts),
            throughput: throughput(successes, wall_clock),
            avg_cpu: usage.avg_cpu,
            avg_mem: usage.avg_mem,
            disk_io_rate: usage.disk_io_rate,
            net_io_rate: usage.net_io_rate,
            attempts,
            successes,
            wall_clock_secs: wall_clock.as_secs_f64(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// `[Done]` line for human output.
    pub fn format_done_line(&self) -> String {
        format!(
            "[Done] {}@{}@{}s: AvgSucc={:.3}s, P50Succ={:.3}s, P95Succ={:.3}s, SR={:.3}",
            self.mode,
            self.concurrency,
            self.timeout,
            self.avg_success_latency,
            self.p50_success_latency,
            self.p95_success_latency,
            self.success_rate
        )
    }

    /// Throughput and host resource line for human output.
    pub fn format_resource_line(&self) -> String {
        format!(
            "       {}/{} ok in {:.1}s ({:.2} urls/sec) | CPU={:.1}% Mem={:.1}MB Disk={:.3}MB/s Net={:.3}MB/s",
            self.successes,
            self.attempts,
            self.wall_clock_secs,
            self.throughput,
            self.avg_cpu,
            self.avg_mem,
            self.disk_io_rate,
            self.net_io_rate
        )
    }
}

fn success_rate(successes: usize, attempts: usize) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        successes as f64 / attempts as f64
    }
}

fn throughput(successes: usize, wall_clock: Duration) -> f64 {
    let secs = wall_clock.as_secs_f64();
    if secs > 0.0 {
        successes as f64 / secs
    } else {
        0.0
    }
}
