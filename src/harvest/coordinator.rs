//! Stage coordinator - wiring of the two harvest stages
//!
//! This module connects the configuration to the core pipeline:
//! - Building the shared fetcher, pacing and per-stage identity rotation
//! - Turning the page range or the links file into work units
//! - Running the units through the multi-round retry policy
//! - Aggregating results and writing each stage's output

use crate::config::Config;
use crate::extract::{ListingExtractor, ProductExtractor};
use crate::harvest::fetcher::{HttpFetcher, PageFetcher};
use crate::harvest::identity::IdentityRotator;
use crate::harvest::pacing::{Pacing, RandomPacing};
use crate::harvest::rounds::{run_with_retries, RetryPolicy};
use crate::harvest::runner::TaskRunner;
use crate::harvest::sink::{LinkSet, RecordSink};
use crate::output::{
    append_links, check_output_path, existing_links, read_links, write_failed, write_products,
    HarvestSummary,
};
use crate::work::ListingPage;
use crate::HarvestError;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Runs the harvest stages against one configuration
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    pacing: Arc<dyn Pacing>,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP with random pacing
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run either stage
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::new(&config.http)?;
        let pacing = RandomPacing::from_config(&config.pacing);
        Ok(Self::with_components(
            config,
            Arc::new(fetcher),
            Arc::new(pacing),
        ))
    }

    /// Creates a coordinator with a caller-supplied fetcher and pacing
    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        pacing: Arc<dyn Pacing>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            pacing,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.http.request_timeout_ms)
    }

    fn runner<E>(&self, extractor: E, referer: &str) -> Result<TaskRunner<E>, HarvestError> {
        let identities = IdentityRotator::from_config(&self.config.identity, referer)?;
        Ok(TaskRunner::new(
            Arc::clone(&self.fetcher),
            Arc::new(identities),
            Arc::clone(&self.pacing),
            extractor,
            self.request_timeout(),
        ))
    }

    /// Discovers product links across the configured listing pages
    ///
    /// New links are appended to the discovery output. Links already in
    /// the file and links without a category are not written.
    pub async fn discover_links(&self) -> Result<HarvestSummary, HarvestError> {
        let started_at = Utc::now();
        let discovery = &self.config.discovery;

        let base_url = Url::parse(&discovery.base_url)?;
        let referer = discovery
            .referer
            .clone()
            .unwrap_or_else(|| discovery.base_url.clone());
        let extractor = ListingExtractor::new(&self.config.selectors.listing)?;
        let runner = self.runner(extractor, &referer)?;

        let output_path = Path::new(&discovery.output_path);
        check_output_path(output_path)?;
        let already_persisted = existing_links(output_path)?;

        let pages = ListingPage::range(&base_url, discovery.first_page, discovery.last_page);
        let unit_count = pages.len();
        tracing::info!(
            "Discovering links on {} listing page(s) of {}",
            unit_count,
            base_url
        );

        let outcome = run_with_retries(&runner, pages, &RetryPolicy::from(discovery)).await;

        let mut links = LinkSet::new();
        for (page, records) in &outcome.succeeded {
            tracing::info!("Page {}: {} links found", page.page_number, records.len());
            links.merge(records.iter().cloned());
        }
        for failed in &outcome.failed {
            tracing::warn!("Page {} not harvested: {}", failed.unit.page_number, failed.reason);
        }

        let persistable = links.persistable(&already_persisted);
        let written = append_links(output_path, &persistable)?;

        tracing::info!(
            "Wrote {} new link(s) to {} ({} distinct record(s) discovered, {} already present)",
            written,
            output_path.display(),
            links.len(),
            already_persisted.len()
        );

        Ok(HarvestSummary::from_outcome(
            "links",
            started_at,
            unit_count,
            &outcome,
            written,
        ))
    }

    /// Extracts product details for every link in the detail-stage input
    ///
    /// The details output is overwritten. Links that could not be harvested
    /// go to `failed-path` when one is configured and are logged otherwise.
    pub async fn harvest_details(&self) -> Result<HarvestSummary, HarvestError> {
        let started_at = Utc::now();
        let details = &self.config.details;

        let extractor = ProductExtractor::new(&self.config.selectors.product)?;
        let runner = self.runner(extractor, &details.referer)?;

        let output_path = Path::new(&details.output_path);
        check_output_path(output_path)?;
        let failed_path = details.failed_path.as_deref().map(Path::new);
        if let Some(failed_path) = failed_path {
            check_output_path(failed_path)?;
        }

        let input_path = Path::new(&details.input_path);
        let links = read_links(input_path)?;
        let unit_count = links.len();
        tracing::info!(
            "Harvesting details for {} link(s) from {}",
            unit_count,
            input_path.display()
        );

        let outcome = run_with_retries(&runner, links, &RetryPolicy::from(details)).await;

        let mut sink = RecordSink::new();
        sink.append(outcome.succeeded.iter().map(|(_, record)| record.clone()));

        let written = write_products(output_path, sink.records())?;
        tracing::info!("Wrote {} product(s) to {}", written, output_path.display());

        if !outcome.failed.is_empty() {
            match failed_path {
                Some(failed_path) => {
                    write_failed(failed_path, &outcome.failed)?;
                    tracing::warn!(
                        "{} link(s) not harvested, listed in {}",
                        outcome.failed.len(),
                        failed_path.display()
                    );
                }
                None => {
                    for failed in &outcome.failed {
                        tracing::warn!("Not harvested: {} ({})", failed.unit, failed.reason);
                    }
                }
            }
        }

        Ok(HarvestSummary::from_outcome(
            "details",
            started_at,
            unit_count,
            &outcome,
            written,
        ))
    }

    /// Runs link discovery followed by detail harvesting
    pub async fn run_all(&self) -> Result<Vec<HarvestSummary>, HarvestError> {
        let links = self.discover_links().await?;
        let details = self.harvest_details().await?;
        Ok(vec![links, details])
    }
}
