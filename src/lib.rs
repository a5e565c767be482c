//! Catalog-Harvest: polite, fault-tolerant harvesting of a paginated catalog
//!
//! This crate discovers item links across a range of listing pages and then
//! visits each item to extract structured records, using a bounded worker
//! pool with randomized pacing, identity rotation and bounded retries.

pub mod config;
pub mod extract;
pub mod harvest;
pub mod output;
pub mod work;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
///
/// These are process-level failures. Failures of a single unit of work are
/// never surfaced through this type; they end up in the failed set of a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{Coordinator, FetchError, RunOutcome, Scheduler, TaskRunner};
pub use work::{LinkRecord, ListingPage, ProductLink, ProductRecord, WorkUnit};
