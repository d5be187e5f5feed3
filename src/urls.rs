//! URL list loading
//!
//! Reads a line-oriented URL list: one URL per line, surrounding
//! whitespace trimmed, blank lines skipped. The result keeps file order
//! and is truncated to a maximum count; skipped blank lines never count
//! toward that maximum.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// URL source errors
#[derive(Debug, thiserror::Error)]
pub enum UrlSourceError {
    /// The URL list file does not exist
    #[error("URL list not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// The URL list could not be read
    #[error("failed to read URL list {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Load up to `limit` URLs from `path`.
///
/// # Errors
/// Returns [`UrlSourceError::ResourceNotFound`] if the file is missing and
/// [`UrlSourceError::Io`] for any other read failure.
pub fn load_urls<P: AsRef<Path>>(path: P, limit: usize) -> Result<Vec<String>, UrlSourceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => UrlSourceError::ResourceNotFound(path.to_path_buf()),
        _ => UrlSourceError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut urls = Vec::new();
    for line in BufReader::new(file).lines() {
        if urls.len() >= limit {
            break;
        }
        let line = line.map_err(|e| UrlSourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        urls.push(trimmed.to_string());
    }

    debug!("Read {} URLs from {}", urls.len(), path.display());
    info!(path = %path.display(), count = urls.len(), limit, "Loaded URL list");
    Ok(urls)
}
