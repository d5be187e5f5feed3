//! End-to-end runs through `BenchmarkRunner` with scripted strategies and host metrics

use async_trait::async_trait;
use fetch_bench::bench::monitor::{HostMetrics, IoCounters, MonitorError, ResourceSample};
use fetch_bench::bench::{BenchError, BenchmarkRunner, TimeoutExecutor};
use fetch_bench::fetcher::{FetchMode, FetchResult, FetchStrategy, FetcherError};
use fetch_bench::shutdown::ShutdownCoordinator;
use fetch_bench::BenchmarkRun;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Strategy scripted by URL: `ok-<ms>` succeeds after `<ms>`, `err-<ms>` fails after it.
/// Anything after `#` is ignored so URLs can be made unique.
struct Scripted {
    mode: FetchMode,
    attempts: AtomicUsize,
}

impl Scripted {
    fn new(mode: FetchMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FetchStrategy for Scripted {
    async fn attempt(&self, url: &str, _timeout: Duration) -> FetchResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let (kind, rest) = url.split_once('-').expect("scripted url");
        let ms: u64 = rest.split('#').next().unwrap().parse().unwrap();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        match kind {
            "ok" => Ok(()),
            "panic" => panic!("scripted panic"),
            _ => Err(FetcherError::UnexpectedStatus(502)),
        }
    }

    fn mode(&self) -> FetchMode {
        self.mode
    }
}

/// Host with constant CPU/memory and counters growing 1 MB per reading.
struct SteadyHost {
    readings: u64,
}

impl HostMetrics for SteadyHost {
    fn sample_usage(&mut self) -> Result<ResourceSample, MonitorError> {
        Ok(ResourceSample {
            cpu_percent: 25.0,
            memory_mb: 512.0,
        })
    }

    fn io_counters(&mut self) -> Result<IoCounters, MonitorError> {
        self.readings += 1;
        Ok(IoCounters {
            disk_read_bytes: self.readings * 1024 * 1024,
            net_bytes: self.readings * 2 * 1024 * 1024,
        })
    }
}

fn runner(strategy: Arc<Scripted>) -> BenchmarkRunner {
    BenchmarkRunner::new(strategy).with_host_metrics(|| Box::new(SteadyHost { readings: 0 }))
}

fn urls(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}#{i}")).collect()
}

#[tokio::test(start_paused = true)]
async fn test_all_succeed_bounded_by_pool_width() {
    let strategy = Scripted::new(FetchMode::Http);
    let run = BenchmarkRun::new(FetchMode::Http, 2, Duration::from_secs(5));

    let summary = runner(strategy.clone())
        .run(&run, urls("ok-1000", 10))
        .await
        .unwrap();

    assert_eq!(strategy.attempts.load(Ordering::SeqCst), 10);
    assert_eq!(summary.attempts, 10);
    assert_eq!(summary.success_rate, 1.0);
    assert!((summary.avg_success_latency - 1.0).abs() < 1e-9);
    assert!((summary.p50_success_latency - 1.0).abs() < 1e-9);
    assert!((summary.p95_success_latency - 1.0).abs() < 1e-9);
    assert!((summary.wall_clock_secs - 5.0).abs() < 1e-6);
    assert!((summary.throughput - 2.0).abs() < 1e-6);
    assert!((summary.avg_cpu - 25.0).abs() < 1e-9);
    assert!((summary.avg_mem - 512.0).abs() < 1e-9);
    assert!((summary.disk_io_rate - 0.2).abs() < 1e-6);
    assert!((summary.net_io_rate - 0.4).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_late_successes_are_clamped_failures() {
    let strategy = Scripted::new(FetchMode::Chrome);
    let run = BenchmarkRun::new(FetchMode::Chrome, 4, Duration::from_secs(5));
    let list = vec![
        "ok-2000#a".to_string(),
        "ok-8000#b".to_string(),
        "ok-2000#c".to_string(),
        "ok-8000#d".to_string(),
    ];

    let summary = runner(strategy).run(&run, list).await.unwrap();

    assert_eq!(summary.attempts, 4);
    assert_eq!(summary.successes, 2);
    assert_eq!(summary.success_rate, 0.5);
    assert!((summary.avg_success_latency - 2.0).abs() < 1e-9);
    assert!((summary.p95_success_latency - 2.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_hung_strategy_does_not_stall_run() {
    let strategy = Scripted::new(FetchMode::ChromeNoJs);
    let run = BenchmarkRun::new(FetchMode::ChromeNoJs, 1, Duration::from_secs(2));

    let summary = runner(strategy)
        .with_executor(TimeoutExecutor::new().with_deadline_grace(Duration::from_secs(1)))
        .run(&run, vec!["ok-3600000".to_string(), "ok-500".to_string()])
        .await
        .unwrap();

    assert_eq!(summary.attempts, 2);
    assert_eq!(summary.successes, 1);
    assert!((summary.wall_clock_secs - 3.5).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_errors_and_panics_become_failures() {
    let strategy = Scripted::new(FetchMode::Http);
    let run = BenchmarkRun::new(FetchMode::Http, 3, Duration::from_secs(5));
    let list = vec![
        "err-100".to_string(),
        "panic-0".to_string(),
        "ok-300".to_string(),
    ];

    let summary = runner(strategy).run(&run, list).await.unwrap();

    assert_eq!(summary.attempts, 3);
    assert_eq!(summary.successes, 1);
    assert!((summary.success_rate - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_empty_list_summary_is_zero() {
    let run = BenchmarkRun::new(FetchMode::Http, 8, Duration::from_secs(5));
    let summary = runner(Scripted::new(FetchMode::Http))
        .run(&run, Vec::new())
        .await
        .unwrap();

    assert_eq!(summary.attempts, 0);
    assert_eq!(summary.success_rate, 0.0);
    assert_eq!(summary.avg_success_latency, 0.0);
    assert_eq!(summary.p50_success_latency, 0.0);
    assert_eq!(summary.p95_success_latency, 0.0);
    assert_eq!(summary.throughput, 0.0);
    assert_eq!(summary.avg_cpu, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_run_summarises_attempted_urls() {
    let interrupt = ShutdownCoordinator::shared();
    interrupt.request_shutdown();
    let strategy = Scripted::new(FetchMode::Http);
    let run = BenchmarkRun::new(FetchMode::Http, 2, Duration::from_secs(5));

    let summary = runner(strategy.clone())
        .with_interrupt(interrupt)
        .run(&run, urls("ok-100", 5))
        .await
        .unwrap();

    assert_eq!(strategy.attempts.load(Ordering::SeqCst), 0);
    assert_eq!(summary.attempts, 0);
    assert_eq!(summary.success_rate, 0.0);
}

#[tokio::test]
async fn test_invalid_run_rejected() {
    let run = BenchmarkRun::new(FetchMode::Http, 0, Duration::from_secs(5));
    let result = runner(Scripted::new(FetchMode::Http))
        .run(&run, urls("ok-1", 1))
        .await;
    assert!(matches!(result, Err(BenchError::InvalidRun(_))));
}
