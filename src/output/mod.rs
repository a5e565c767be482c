//! Output module for harvest results
//!
//! This module handles:
//! - Appending discovered links to the link file (and reading it back)
//! - Writing extracted product records
//! - Writing the list of links that could not be harvested
//! - Summarizing a stage run

mod links;
mod products;
pub mod stats;

pub use links::{append_links, existing_links, read_links, LINK_HEADERS};
pub use products::{write_failed, write_products, FAILED_HEADERS, PRODUCT_HEADERS};
pub use stats::{print_summary, HarvestSummary};

use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading or writing harvest files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable input {path}: {message}")]
    Input { path: String, message: String },

    #[error("Unusable output {path}: {message}")]
    Destination { path: String, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Checks that an output file can be created at `path`
///
/// The path must not be a directory and its parent directory must exist.
/// Stages call this before fetching anything.
pub fn check_output_path(path: &Path) -> OutputResult<()> {
    let unusable = |message: &str| OutputError::Destination {
        path: path.display().to_string(),
        message: message.to_string(),
    };

    if path.as_os_str().is_empty() {
        return Err(unusable("path is empty"));
    }
    if path.is_dir() {
        return Err(unusable("path is a directory"));
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(unusable("parent directory does not exist"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_output_path() {
        let dir = TempDir::new().unwrap();

        assert!(check_output_path(&dir.path().join("links.csv")).is_ok());
        assert!(check_output_path(Path::new("links.csv")).is_ok());

        assert!(matches!(
            check_output_path(dir.path()),
            Err(OutputError::Destination { .. })
        ));
        assert!(matches!(
            check_output_path(&dir.path().join("missing").join("links.csv")),
            Err(OutputError::Destination { .. })
        ));
    }
}
