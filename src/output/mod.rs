//! Summary log writers

use crate::bench::RunSummary;

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persistent, append-only record of run summaries
pub trait SummaryWriter {
    /// Append one summary
    fn append(&mut self, summary: &RunSummary) -> OutputResult<()>;
}
