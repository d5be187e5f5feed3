//! Summary log across consecutive runs

use async_trait::async_trait;
use fetch_bench::bench::monitor::{HostMetrics, IoCounters, MonitorError, ResourceSample};
use fetch_bench::bench::BenchmarkRunner;
use fetch_bench::fetcher::{FetchMode, FetchResult, FetchStrategy};
use fetch_bench::output::csv::{CsvSummaryLog, SUMMARY_HEADER};
use fetch_bench::output::SummaryWriter;
use fetch_bench::BenchmarkRun;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Succeeds after a fixed delay.
struct FixedDelay(Duration, FetchMode);

#[async_trait]
impl FetchStrategy for FixedDelay {
    async fn attempt(&self, _url: &str, _timeout: Duration) -> FetchResult<()> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }

    fn mode(&self) -> FetchMode {
        self.1
    }
}

struct Unavailable;

impl HostMetrics for Unavailable {
    fn sample_usage(&mut self) -> Result<ResourceSample, MonitorError> {
        Err(MonitorError::SamplingUnavailable("test host".to_string()))
    }

    fn io_counters(&mut self) -> Result<IoCounters, MonitorError> {
        Err(MonitorError::SamplingUnavailable("test host".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_runs_share_one_table() {
    let temp_dir = TempDir::new().unwrap();
    let mut log = CsvSummaryLog::new(temp_dir.path().join("log.csv"));
    let urls: Vec<String> = (0..4).map(|i| format!("https://site{i}.example")).collect();

    for (mode, delay_ms, concurrency) in [
        (FetchMode::Http, 250, 4),
        (FetchMode::ChromeNoMedia, 1_500, 2),
    ] {
        let strategy = Arc::new(FixedDelay(Duration::from_millis(delay_ms), mode));
        let run = BenchmarkRun::new(mode, concurrency, Duration::from_secs(10));
        let summary = BenchmarkRunner::new(strategy)
            .with_host_metrics(|| Box::new(Unavailable))
            .run(&run, urls.clone())
            .await
            .unwrap();

        assert_eq!(summary.avg_cpu, 0.0);
        assert_eq!(summary.net_io_rate, 0.0);
        log.append(&summary).unwrap();
    }

    let contents = std::fs::read_to_string(log.path()).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], SUMMARY_HEADER);
    assert_eq!(lines[1], "http,4,10,0.250,0.250,0.250,1.000");
    assert_eq!(lines[2], "chrome-no-media,2,10,1.500,1.500,1.500,1.000");
}
