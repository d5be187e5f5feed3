//! Prometheus metrics for benchmark runs
//!
//! Exposes per-fetch counters and latency histograms labelled by mode and
//! outcome, host resource gauges fed by the resource monitor, and a
//! per-run counter.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate macros at the recording sites
//! - Prometheus exporter for the scrape endpoint, enabled by `--metrics-addr`
//! - Without an installed recorder every call is a no-op

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::bench::monitor::ResourceSample;
use crate::bench::summary::RunSummary;
use crate::fetcher::FetchMode;
use crate::FetchOutcome;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok(())` without reinstalling.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "fetch_attempts_total",
        Unit::Count,
        "Fetch attempts by mode and outcome"
    );

    describe_histogram!(
        "fetch_duration_seconds",
        Unit::Seconds,
        "Fetch duration in seconds, clamped to the run timeout for failures"
    );

    describe_gauge!(
        "host_cpu_percent",
        Unit::Percent,
        "Most recent global CPU utilisation sample"
    );

    describe_gauge!(
        "host_memory_mb",
        Unit::Count,
        "Most recent used memory sample in MB"
    );

    describe_counter!(
        "benchmark_runs_total",
        Unit::Count,
        "Completed benchmark runs by mode"
    );

    describe_gauge!(
        "benchmark_success_rate",
        Unit::Count,
        "Success rate of the latest run by mode"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

fn outcome_label(outcome: &FetchOutcome) -> &'static str {
    if outcome.succeeded {
        "success"
    } else {
        "failure"
    }
}

/// Record one classified fetch attempt.
pub fn record_fetch(mode: FetchMode, outcome: &FetchOutcome) {
    let outcome_label = outcome_label(outcome);

    counter!(
        "fetch_attempts_total",
        "mode" => mode.as_str(),
        "outcome" => outcome_label,
    )
    .increment(1);

    histogram!(
        "fetch_duration_seconds",
        "mode" => mode.as_str(),
        "outcome" => outcome_label,
    )
    .record(outcome.elapsed.as_secs_f64());
}

/// Publish the latest host resource sample.
pub fn record_host_sample(sample: &ResourceSample) {
    gauge!("host_cpu_percent").set(sample.cpu_percent);
    gauge!("host_memory_mb").set(sample.memory_mb);
}

/// Record a finished run.
pub fn record_run(mode: FetchMode, summary: &RunSummary) {
    counter!("benchmark_runs_total", "mode" => mode.as_str()).increment(1);
    gauge!("benchmark_success_rate", "mode" => mode.as_str()).set(summary.success_rate);

    debug!(
        mode = %mode,
        attempts = summary.attempts,
        success_rate = summary.success_rate,
        "Run metrics recorded"
    );
}
