use crate::config::ProductSelectors;
use crate::extract::{compile_selector, element_text, Extraction, Extractor};
use crate::work::{ProductLink, ProductRecord};
use crate::HarvestError;
use scraper::{Html, Selector};

/// Attribute labels recognised on a product page
const SLEEVE_LENGTH_LABEL: &str = "Sleeve Length:";
const NECKLINE_LABEL: &str = "Neckline:";
/// The catalog lists the color under the "Description:" attribute row
const COLOR_LABEL: &str = "Description:";

/// Extracts a product record from a product detail page
#[derive(Debug)]
pub struct ProductExtractor {
    name: Selector,
    description: Selector,
    attribute_row: Selector,
    attribute_label: Selector,
    attribute_value: Selector,
}

impl ProductExtractor {
    pub fn new(selectors: &ProductSelectors) -> Result<Self, HarvestError> {
        Ok(Self {
            name: compile_selector(&selectors.name)?,
            description: compile_selector(&selectors.description)?,
            attribute_row: compile_selector(&selectors.attribute_row)?,
            attribute_label: compile_selector(&selectors.attribute_label)?,
            attribute_value: compile_selector(&selectors.attribute_value)?,
        })
    }

    /// Parses a product page
    ///
    /// Returns `None` only when the product name is missing; any other
    /// missing field is recorded as `None`.
    pub fn parse_product(&self, html: &str, link: &ProductLink) -> Option<ProductRecord> {
        let document = Html::parse_document(html);

        let name = document.select(&self.name).next().and_then(element_text)?;
        let description = document
            .select(&self.description)
            .next()
            .and_then(element_text);

        let mut record = ProductRecord {
            name,
            description,
            url: link.url.clone(),
            sleeve_length: None,
            neckline: None,
            color: None,
            category: link.category.clone(),
        };

        for row in document.select(&self.attribute_row) {
            let label = row.select(&self.attribute_label).next().and_then(element_text);
            let value = row.select(&self.attribute_value).next().and_then(element_text);

            match label.as_deref() {
                Some(SLEEVE_LENGTH_LABEL) => record.sleeve_length = value,
                Some(NECKLINE_LABEL) => record.neckline = value,
                Some(COLOR_LABEL) => record.color = value,
                _ => {}
            }
        }

        Some(record)
    }
}

impl Extractor<ProductLink> for ProductExtractor {
    type Output = ProductRecord;

    fn extract(&self, body: &str, unit: &ProductLink) -> Extraction<ProductRecord> {
        self.parse_product(body, unit).into()
    }
}
