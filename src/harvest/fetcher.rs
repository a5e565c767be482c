//! HTTP fetcher implementation
//!
//! This module handles every outbound request of a harvest:
//! - Building the shared HTTP client
//! - One GET per attempt with the attempt's identity headers
//! - Per-request timeout
//! - Error classification
//!
//! The fetcher never retries; the task runner owns the retry policy so that
//! pacing and identity rotation are re-applied on every attempt.

use crate::config::HttpConfig;
use crate::harvest::identity::Identity;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Classified failure of a single fetch attempt
///
/// Both kinds are treated as retryable by the task runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, timeout, or body read failure
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status
    #[error("HTTP status {code}")]
    HttpStatus { code: u16 },
}

impl FetchError {
    /// Classifies a reqwest error as a transport failure
    fn from_reqwest(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timeout: {}", error)
        } else if error.is_connect() {
            format!("connection failed: {}", error)
        } else {
            error.to_string()
        };
        Self::Transport { message }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::HttpStatus { .. } => true,
        }
    }

    /// Short label used in logs and failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http-status",
        }
    }
}

/// Performs one GET for a target
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `target` once, returning the raw body on a 2xx response
    async fn fetch(
        &self,
        target: &str,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<String, FetchError>;
}

/// Builds the HTTP client shared by all workers
///
/// The client carries no default user agent; each request supplies its
/// own identity headers.
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::HttpConfig;
/// use catalog_harvest::harvest::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        target: &str,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(target)
            .headers(identity.headers().clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }
}
