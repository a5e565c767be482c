//! Harvest module - the concurrent fetch, retry and extract pipeline
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with per-request identities and timeouts
//! - Randomized pacing between attempts
//! - Bounded per-unit retries and bounded-concurrency scheduling
//! - Multi-round resubmission of failed units
//! - Result aggregation and stage coordination

mod coordinator;
mod fetcher;
mod identity;
mod pacing;
mod rounds;
mod runner;
mod scheduler;
mod sink;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use identity::{baseline_headers, FixedIdentity, Identity, IdentityRotator, IdentitySource};
pub use pacing::{FixedPacing, Pacing, RandomPacing};
pub use rounds::{run_with_retries, HarvestOutcome, RetryPolicy, StopReason};
pub use runner::{AttemptResult, FetchAttempt, RunOutcome, TaskReport, TaskRunner};
pub use scheduler::{FailedUnit, FailureReason, PassReport, Scheduler};
pub use sink::{LinkSet, RecordSink};

use crate::config::Config;
use crate::output::HarvestSummary;
use crate::HarvestError;

/// Runs link discovery with the default HTTP fetcher
///
/// This is the entry point of the first stage. It will:
/// 1. Build the listing-page work units from the page range
/// 2. Fetch and extract every page through the worker pool
/// 3. Retry failed pages in later rounds
/// 4. Append newly discovered links to the links file
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Stage completed; some pages may still have failed
/// * `Err(HarvestError)` - A fatal setup or output error
pub async fn discover_links(config: Config) -> Result<HarvestSummary, HarvestError> {
    Coordinator::new(config)?.discover_links().await
}

/// Runs detail harvesting with the default HTTP fetcher
pub async fn harvest_details(config: Config) -> Result<HarvestSummary, HarvestError> {
    Coordinator::new(config)?.harvest_details().await
}
