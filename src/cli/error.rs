//! CLI error types and conversions

use crate::bench::BenchError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;
use crate::urls::UrlSourceError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// URL list error
    #[error("URL list error: {0}")]
    UrlSourceError(#[from] UrlSourceError),

    /// Fetcher setup error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Benchmark error
    #[error("benchmark error: {0}")]
    BenchError(#[from] BenchError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
