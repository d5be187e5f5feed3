//! Benchmark command implementation

use clap::Parser;
use indicatif::ProgressBar;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

use super::CliError;
use crate::bench::config::{
    default_concurrency, DEFAULT_SUMMARY_LOG, DEFAULT_URL_LIMIT, MAX_CONCURRENCY,
    MAX_DEADLINE_GRACE_SECS, MAX_TIMEOUT_SECS,
};
use crate::bench::progress::create_progress_bar;
use crate::bench::{BenchmarkRunner, RunSummary, TimeoutExecutor};
use crate::fetcher::{create_strategy, FetchMode, StrategyOptions};
use crate::output::csv::CsvSummaryLog;
use crate::output::SummaryWriter;
use crate::shutdown::SharedShutdown;
use crate::urls::load_urls;
use crate::BenchmarkRun;

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Benchmark URL fetching across strategies, concurrency levels and timeouts
#[derive(Debug, Parser)]
#[command(name = "fetch-bench", version, about)]
pub struct Cli {
    /// Fetch strategy
    #[arg(long, value_enum)]
    pub mode: FetchMode,

    /// Number of concurrent workers (default: 16 for http, 4 for browser modes; max: 256)
    #[arg(long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Per-fetch timeout in seconds (max: 3600)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
    pub timeout: u64,

    /// URL list, one URL per line
    #[arg(long, default_value = "urls.txt")]
    pub urls: PathBuf,

    /// Maximum number of URLs to load
    #[arg(long, default_value_t = DEFAULT_URL_LIMIT)]
    pub limit: usize,

    /// Summary log to append to
    #[arg(long, default_value = DEFAULT_SUMMARY_LOG)]
    pub log: PathBuf,

    /// Prefix for the mode name in the summary log
    #[arg(long)]
    pub label: Option<String>,

    /// Output format (json or human)
    #[arg(long, default_value = "human")]
    pub output_format: OutputFormat,

    /// Seconds past the timeout to keep waiting on a stuck fetch (max: 3600)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(0..=MAX_DEADLINE_GRACE_SECS))]
    pub deadline_grace: u64,

    /// Seconds between progress log lines
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub progress_interval: u64,

    /// Chrome/Chromium binary (auto-detected by default)
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, default_value_t = false)]
    pub headful: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Worker count after applying the per-mode default.
    pub fn resolved_concurrency(&self) -> usize {
        self.concurrency
            .unwrap_or_else(|| default_concurrency(self.mode.is_browser()))
    }

    /// Run configuration described by the arguments.
    pub fn benchmark_run(&self) -> BenchmarkRun {
        let run = BenchmarkRun::new(
            self.mode,
            self.resolved_concurrency(),
            Duration::from_secs(self.timeout),
        );
        match &self.label {
            Some(label) => run.with_label(label.clone()),
            None => run,
        }
    }

    /// Load URLs, run the benchmark, append to the summary log and print the result.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<RunSummary, CliError> {
        let urls = load_urls(&self.urls, self.limit)?;
        if urls.is_empty() {
            warn!("URL list {} is empty", self.urls.display());
        }

        let run = self.benchmark_run();
        let options = StrategyOptions {
            chrome_path: self.chrome_path.clone(),
            headful: self.headful,
        };

        // Browser launch blocks until Chrome is up.
        let mode = self.mode;
        let strategy = tokio::task::spawn_blocking(move || create_strategy(mode, &options))
            .await
            .map_err(|e| CliError::ConfigurationError(format!("strategy setup task failed: {e}")))??;

        let bar = match self.output_format {
            OutputFormat::Human => create_progress_bar(&run.mode_label()),
            OutputFormat::Json => ProgressBar::hidden(),
        };

        let runner = BenchmarkRunner::new(strategy)
            .with_executor(
                TimeoutExecutor::new().with_deadline_grace(Duration::from_secs(self.deadline_grace)),
            )
            .with_progress_interval(Duration::from_secs(self.progress_interval))
            .with_progress_bar(bar)
            .with_interrupt(shutdown.clone());

        let summary = runner.run(&run, urls).await?;
        if shutdown.is_shutdown_requested() {
            warn!("Run was interrupted; summary covers attempted URLs only");
        }

        let mut log = CsvSummaryLog::new(&self.log);
        log.append(&summary)?;
        info!("Summary appended to {}", log.path().display());

        match self.output_format {
            OutputFormat::Json => output_json(&summary),
            OutputFormat::Human => output_human(&summary),
        }

        Ok(summary)
    }
}

/// Print the summary as a single JSON object
fn output_json(summary: &RunSummary) {
    match serde_json::to_string(summary) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to serialize summary: {}", e),
    }
}

/// Print the `[Done]` and resource lines
fn output_human(summary: &RunSummary) {
    println!("{}", summary.format_done_line());
    println!("{}", summary.format_resource_line());
}
