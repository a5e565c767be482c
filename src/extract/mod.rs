//! Extraction of structured data from fetched markup
//!
//! An extractor is a pure function of a response body and the work unit it
//! was fetched for. It never performs I/O and never fails: markup that does
//! not contain the primary field yields [`Extraction::Absent`].

mod listing;
mod product;

pub use listing::ListingExtractor;
pub use product::ProductExtractor;

use crate::HarvestError;
use scraper::{ElementRef, Selector};

/// Result of running an extractor over a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    /// The page carried the primary field; other fields may still be missing
    Found(T),

    /// The page loaded but the primary field could not be located
    Absent,
}

impl<T> Extraction<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T> From<Option<T>> for Extraction<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(found) => Self::Found(found),
            None => Self::Absent,
        }
    }
}

/// Maps a fetched body to the output of a work unit
///
/// Implementations are shared across workers, so they must be `Send + Sync`.
pub trait Extractor<U>: Send + Sync + 'static {
    type Output: Send + 'static;

    fn extract(&self, body: &str, unit: &U) -> Extraction<Self::Output>;
}

/// Compiles a CSS selector, reporting failures as a harvest error
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Collects the text of an element, trimming each fragment
///
/// Returns `None` when the element holds no visible text.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_extraction_from_option() {
        assert_eq!(Extraction::from(Some(3)), Extraction::Found(3));
        assert!(Extraction::<u8>::from(None).is_absent());
    }

    #[test]
    fn test_compile_selector_error() {
        let err = compile_selector("div[").unwrap_err();
        assert!(matches!(err, HarvestError::Selector { .. }));
    }

    #[test]
    fn test_element_text_joins_fragments() {
        let html = Html::parse_fragment("<p>  Soft <b>cotton</b>\n top </p>");
        let selector = compile_selector("p").unwrap();
        let element = html.select(&selector).next().unwrap();
        assert_eq!(element_text(element), Some("Soft cotton top".to_string()));
    }

    #[test]
    fn test_element_text_empty() {
        let html = Html::parse_fragment("<p>   </p>");
        let selector = compile_selector("p").unwrap();
        let element = html.select(&selector).next().unwrap();
        assert_eq!(element_text(element), None);
    }
}
