/// Work unit definitions for both harvest stages
use std::fmt;
use std::hash::Hash;
use url::Url;

/// One schedulable fetch job
///
/// Units are immutable values; identity is the tuple of their fields.
pub trait WorkUnit: Clone + fmt::Debug + fmt::Display + Eq + Hash + Send + Sync + 'static {
    /// The URL fetched for this unit
    fn target(&self) -> &str;
}

/// A listing page of the catalog, visited during link discovery
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListingPage {
    /// 1-based page number
    pub page_number: u32,

    /// Listing URL with the page number applied
    pub url: String,
}

impl ListingPage {
    /// Builds the unit for `page_number` by appending `page=N` to `base_url`
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_harvest::work::ListingPage;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://shop.example.com/tops.html").unwrap();
    /// let page = ListingPage::new(&base, 3);
    /// assert_eq!(page.url, "https://shop.example.com/tops.html?page=3");
    /// ```
    pub fn new(base_url: &Url, page_number: u32) -> Self {
        let mut url = base_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &page_number.to_string());

        Self {
            page_number,
            url: url.to_string(),
        }
    }

    /// Builds one unit per page in `first..=last`
    pub fn range(base_url: &Url, first: u32, last: u32) -> Vec<Self> {
        (first..=last).map(|page| Self::new(base_url, page)).collect()
    }
}

impl WorkUnit for ListingPage {
    fn target(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ListingPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}", self.page_number)
    }
}

/// A product detail page, visited during detail extraction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductLink {
    pub url: String,

    /// Category recorded at discovery time, passed through to the record
    pub category: String,
}

impl ProductLink {
    pub fn new(url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
        }
    }
}

impl WorkUnit for ProductLink {
    fn target(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ProductLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
