//! Link discovery on catalog listing pages
//!
//! For each product item on a listing page this extracts:
//! - the product link, resolved to a canonical absolute URL
//! - the item's category attribute, or `"N/A"` when the item carries none

use crate::config::ListingSelectors;
use crate::extract::{compile_selector, Extraction, Extractor};
use crate::work::{LinkRecord, ListingPage, UNKNOWN_CATEGORY};
use crate::HarvestError;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracts product links from a listing page
#[derive(Debug)]
pub struct ListingExtractor {
    item: Selector,
    category: Selector,
    category_attribute: String,
    link: Selector,
    pagination_marker: String,
}

impl ListingExtractor {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(ListingExtractor)` - All selectors compiled
    /// * `Err(HarvestError::Selector)` - A selector is not valid CSS
    pub fn new(selectors: &ListingSelectors) -> Result<Self, HarvestError> {
        Ok(Self {
            item: compile_selector(&selectors.item)?,
            category: compile_selector(&selectors.category)?,
            category_attribute: selectors.category_attribute.clone(),
            link: compile_selector(&selectors.link)?,
            pagination_marker: selectors.pagination_marker.clone(),
        })
    }

    /// Parses a listing page into its link records
    ///
    /// Returns `None` when the page holds no product items at all.
    pub fn parse_listing(&self, html: &str, page: &ListingPage) -> Option<Vec<LinkRecord>> {
        let base_url = match Url::parse(&page.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Cannot resolve links against {}: {}", page.url, e);
                return None;
            }
        };

        let document = Html::parse_document(html);
        let mut items = document.select(&self.item).peekable();
        items.peek()?;

        let mut records = BTreeSet::new();
        for item in items {
            let category = item
                .select(&self.category)
                .next()
                .and_then(|element| element.value().attr(&self.category_attribute))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(UNKNOWN_CATEGORY);

            let Some(href) = item
                .select(&self.link)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
            else {
                continue;
            };

            let Some(link) = resolve_link(href, &base_url) else {
                continue;
            };

            if !self.pagination_marker.is_empty() && link.contains(&self.pagination_marker) {
                continue;
            }

            records.insert(LinkRecord::new(page.page_number, link, category));
        }

        Some(records.into_iter().collect())
    }
}

impl Extractor<ListingPage> for ListingExtractor {
    type Output = Vec<LinkRecord>;

    fn extract(&self, body: &str, unit: &ListingPage) -> Extraction<Vec<LinkRecord>> {
        self.parse_listing(body, unit).into()
    }
}

/// Resolves a link href to an absolute URL
///
/// Returns None for empty hrefs, fragment-only anchors, and anything that
/// does not resolve to an HTTP(S) URL.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
