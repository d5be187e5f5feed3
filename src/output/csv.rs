//! CSV summary log
//!
//! One row per run. The header is written only when the log file is
//! created, so repeated runs accumulate in a single table.

use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{OutputError, OutputResult, SummaryWriter};
use crate::bench::RunSummary;

/// Header row of the summary log
pub const SUMMARY_HEADER: &str =
    "Mode,Concurrency,Timeout(s),AvgSucc(s),P50Succ(s),P95Succ(s),SuccessRate";

/// CSV record for one run summary
#[derive(Debug, Serialize)]
struct SummaryRecord {
    #[serde(rename = "Mode")]
    mode: String,
    #[serde(rename = "Concurrency")]
    concurrency: usize,
    #[serde(rename = "Timeout(s)")]
    timeout: String,
    #[serde(rename = "AvgSucc(s)")]
    avg_success: String,
    #[serde(rename = "P50Succ(s)")]
    p50_success: String,
    #[serde(rename = "P95Succ(s)")]
    p95_success: String,
    #[serde(rename = "SuccessRate")]
    success_rate: String,
}

impl From<&RunSummary> for SummaryRecord {
    fn from(summary: &RunSummary) -> Self {
        Self {
            mode: summary.mode.clone(),
            concurrency: summary.concurrency,
            timeout: summary.timeout.to_string(),
            avg_success: format!("{:.3}", summary.avg_success_latency),
            p50_success: format!("{:.3}", summary.p50_success_latency),
            p95_success: format!("{:.3}", summary.p95_success_latency),
            success_rate: format!("{:.3}", summary.success_rate),
        }
    }
}

/// Append-only CSV log of run summaries
#[derive(Debug, Clone)]
pub struct CsvSummaryLog {
    path: PathBuf,
}

impl CsvSummaryLog {
    /// Create a log handle for `path`. Nothing is touched until the first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummaryWriter for CsvSummaryLog {
    fn append(&mut self, summary: &RunSummary) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OutputError::IoError(format!("Failed to open summary log: {}", e)))?;

        let mut writer = WriterBuilder::new().has_headers(write_header).from_writer(file);
        writer
            .serialize(SummaryRecord::from(summary))
            .map_err(|e| OutputError::CsvError(format!("Failed to write summary: {}", e)))?;
        writer
            .flush()
            .map_err(|e| OutputError::IoError(format!("Failed to flush summary log: {}", e)))?;

        if write_header {
            info!("Created summary log: {}", self.path.display());
        }
        debug!(mode = %summary.mode, path = %self.path.display(), "Summary appended");
        Ok(())
    }
}
