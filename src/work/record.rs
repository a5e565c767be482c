use serde::{Deserialize, Serialize};

/// Category value meaning "not recorded on the listing"
///
/// Links carrying it are kept in memory but never persisted.
pub const UNKNOWN_CATEGORY: &str = "N/A";

/// A product link found on a listing page
///
/// Field order drives the derived ordering: records sort by
/// `(page_number, link, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkRecord {
    pub page_number: u32,

    /// Canonical absolute URL of the product page
    pub link: String,

    #[serde(rename = "data_category")]
    pub category: String,
}

impl LinkRecord {
    pub fn new(page_number: u32, link: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            page_number,
            link: link.into(),
            category: category.into(),
        }
    }

    /// Returns true if the listing did not carry a category for this link
    pub fn has_unknown_category(&self) -> bool {
        self.category == UNKNOWN_CATEGORY
    }
}

/// Structured fields extracted from a product page
///
/// Every field except the name may be absent from the markup; absent fields
/// are kept as `None` rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Product Name")]
    pub name: String,

    #[serde(rename = "Description")]
    pub description: Option<String>,

    #[serde(rename = "Product URL")]
    pub url: String,

    #[serde(rename = "Sleeve Length")]
    pub sleeve_length: Option<String>,

    #[serde(rename = "Neckline")]
    pub neckline: Option<String>,

    #[serde(rename = "Color")]
    pub color: Option<String>,

    #[serde(rename = "Category")]
    pub category: String,
}
