//! Unit tests for the benchmark CLI arguments

use clap::Parser;
use fetch_bench::cli::{Cli, OutputFormat};
use fetch_bench::fetcher::FetchMode;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_http_defaults() {
    let cli = Cli::parse_from(["fetch-bench", "--mode", "http"]);

    assert_eq!(cli.mode, FetchMode::Http);
    assert_eq!(cli.concurrency, None);
    assert_eq!(cli.resolved_concurrency(), 16);
    assert_eq!(cli.timeout, 10);
    assert_eq!(cli.urls, PathBuf::from("urls.txt"));
    assert_eq!(cli.limit, 10_000);
    assert_eq!(cli.log, PathBuf::from("results/log.csv"));
    assert_eq!(cli.output_format, OutputFormat::Human);
    assert_eq!(cli.deadline_grace, 5);
    assert_eq!(cli.progress_interval, 5);
    assert!(!cli.headful);
    assert!(cli.metrics_addr.is_none());
}

#[test]
fn test_browser_modes_default_to_fewer_workers() {
    for mode in ["chrome", "chrome-no-js", "chrome-no-media"] {
        let cli = Cli::parse_from(["fetch-bench", "--mode", mode]);
        assert!(cli.mode.is_browser());
        assert_eq!(cli.resolved_concurrency(), 4, "{mode}");
    }
}

#[test]
fn test_explicit_values_override_defaults() {
    let cli = Cli::parse_from([
        "fetch-bench",
        "--mode",
        "chrome-no-js",
        "--concurrency",
        "32",
        "--timeout",
        "3",
        "--output-format",
        "json",
        "--metrics-addr",
        "127.0.0.1:9090",
        "--chrome-path",
        "/usr/bin/chromium",
        "--headful",
    ]);

    assert_eq!(cli.resolved_concurrency(), 32);
    assert_eq!(cli.output_format, OutputFormat::Json);
    assert_eq!(cli.metrics_addr.unwrap().port(), 9090);
    assert_eq!(cli.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    assert!(cli.headful);

    let run = cli.benchmark_run();
    assert_eq!(run.mode, FetchMode::ChromeNoJs);
    assert_eq!(run.concurrency, 32);
    assert_eq!(run.timeout, Duration::from_secs(3));
    assert_eq!(run.label, None);
}

#[test]
fn test_rejects_out_of_range_values() {
    for args in [
        vec!["fetch-bench"],
        vec!["fetch-bench", "--mode", "wget"],
        vec!["fetch-bench", "--mode", "http", "--concurrency", "0"],
        vec!["fetch-bench", "--mode", "http", "--concurrency", "257"],
        vec!["fetch-bench", "--mode", "http", "--timeout", "0"],
        vec!["fetch-bench", "--mode", "http", "--timeout", "3601"],
        vec!["fetch-bench", "--mode", "http", "--deadline-grace", "18446744073709551615"],
        vec!["fetch-bench", "--mode", "http", "--deadline-grace", "3601"],
        vec!["fetch-bench", "--mode", "http", "--progress-interval", "0"],
        vec!["fetch-bench", "--mode", "http", "--output-format", "xml"],
    ] {
        assert!(Cli::try_parse_from(&args).is_err(), "{args:?} should be rejected");
    }
}

#[test]
fn test_accepts_largest_timeout_and_grace() {
    let cli = Cli::try_parse_from([
        "fetch-bench",
        "--mode",
        "http",
        "--timeout",
        "3600",
        "--deadline-grace",
        "3600",
    ])
    .unwrap();
    assert_eq!(cli.timeout, 3600);
    assert_eq!(cli.deadline_grace, 3600);
}
