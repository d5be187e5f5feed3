//! Benchmark configuration constants

use std::time::Duration;

/// Default per-fetch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default worker count for plain HTTP runs.
pub const DEFAULT_HTTP_CONCURRENCY: usize = 16;

/// Default worker count for browser runs.
/// Each worker holds an open tab, so browser runs default much lower.
pub const DEFAULT_BROWSER_CONCURRENCY: usize = 4;

/// Largest accepted per-fetch timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 3_600;

/// Largest accepted deadline grace in seconds.
pub const MAX_DEADLINE_GRACE_SECS: u64 = 3_600;

/// Maximum allowed worker count.
pub const MAX_CONCURRENCY: usize = 256;

/// Default maximum number of URLs loaded from the list.
pub const DEFAULT_URL_LIMIT: usize = 10_000;

/// Interval between resource samples.
/// CPU usage is measured over this window, so it is also the shortest run
/// that yields a non-zero CPU average.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Extra time past the run timeout before the executor stops waiting on an
/// attempt. Strategies are expected to cut themselves off at the timeout;
/// this only bounds a strategy that does not.
pub const DEFAULT_DEADLINE_GRACE: Duration = Duration::from_secs(5);

/// Interval between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Default summary log location.
pub const DEFAULT_SUMMARY_LOG: &str = "results/log.csv";

/// Bytes per megabyte used for memory and IO rates.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Default worker count for a mode.
pub fn default_concurrency(is_browser: bool) -> usize {
    if is_browser {
        DEFAULT_BROWSER_CONCURRENCY
    } else {
        DEFAULT_HTTP_CONCURRENCY
    }
}
