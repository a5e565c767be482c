use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
///
/// Every section is optional; a missing section (or key) falls back to the
/// baseline values below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub pacing: PacingConfig,
    pub identity: IdentityConfig,
    pub discovery: DiscoveryConfig,
    pub details: DetailsConfig,
    pub selectors: SelectorsConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            connect_timeout_ms: 10_000,
        }
    }
}

/// Randomized delay ranges applied before each fetch attempt
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    /// Lower bound of the delay before a first attempt (milliseconds)
    pub attempt_delay_min_ms: u64,

    /// Upper bound of the delay before a first attempt (milliseconds)
    pub attempt_delay_max_ms: u64,

    /// Lower bound of the delay before a retry (milliseconds)
    pub retry_delay_min_ms: u64,

    /// Upper bound of the delay before a retry (milliseconds)
    pub retry_delay_max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            attempt_delay_min_ms: 1_000,
            attempt_delay_max_ms: 5_000,
            retry_delay_min_ms: 5_000,
            retry_delay_max_ms: 10_000,
        }
    }
}

/// Outbound request identity: the user-agent pool and baseline headers
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdentityConfig {
    /// Browser user-agent strings, one drawn at random per attempt
    pub user_agents: Vec<String>,

    /// `Accept` header value
    pub accept: String,

    /// `Accept-Language` header value
    pub accept_language: String,

    /// `Connection` header value
    pub connection: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:84.0) Gecko/20100101 Firefox/84.0".to_string(),
                "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1".to_string(),
            ],
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            connection: "keep-alive".to_string(),
        }
    }
}

/// Link discovery stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Listing URL; the page number is appended as `?page=N`
    pub base_url: String,

    /// First listing page (inclusive)
    pub first_page: u32,

    /// Last listing page (inclusive)
    pub last_page: u32,

    /// Referer header sent with listing requests (defaults to `base_url`)
    pub referer: Option<String>,

    /// Appendable CSV file receiving discovered links
    pub output_path: String,

    /// Worker count for the first round
    pub pool_size: usize,

    /// Worker count for retry rounds
    pub retry_pool_size: usize,

    /// Fetch attempts per page in the first round
    pub max_attempts: u32,

    /// Fetch attempts per page in retry rounds
    pub retry_max_attempts: u32,

    /// Maximum number of rounds, the first one included
    pub max_rounds: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www2.hm.com/en_us/women/products/tops.html".to_string(),
            first_page: 1,
            last_page: 31,
            referer: None,
            output_path: "product_links.csv".to_string(),
            pool_size: 10,
            retry_pool_size: 5,
            max_attempts: 3,
            retry_max_attempts: 2,
            max_rounds: 5,
        }
    }
}

/// Detail extraction stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DetailsConfig {
    /// CSV file of discovered links to visit
    pub input_path: String,

    /// CSV file receiving extracted records, overwritten each run
    pub output_path: String,

    /// Optional CSV file listing links that could not be harvested
    pub failed_path: Option<String>,

    /// Referer header sent with detail requests
    pub referer: String,

    /// Worker count for the primary pass
    pub pool_size: usize,

    /// Worker count for the retry pass
    pub retry_pool_size: usize,

    /// Fetch attempts per link in the primary pass
    pub max_attempts: u32,

    /// Fetch attempts per link in the retry pass
    pub retry_max_attempts: u32,

    /// Maximum number of passes, the primary one included
    pub max_rounds: u32,
}

impl Default for DetailsConfig {
    fn default() -> Self {
        Self {
            input_path: "product_links.csv".to_string(),
            output_path: "product_details.csv".to_string(),
            failed_path: None,
            referer: "https://www.google.com/".to_string(),
            pool_size: 10,
            retry_pool_size: 5,
            max_attempts: 20,
            retry_max_attempts: 2,
            max_rounds: 2,
        }
    }
}

/// CSS selectors used by the extractors
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectorsConfig {
    pub listing: ListingSelectors,
    pub product: ProductSelectors,
}

/// Selectors locating product links on a listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingSelectors {
    /// One element per product on the listing
    pub item: String,

    /// Element (within an item) carrying the category attribute
    pub category: String,

    /// Attribute holding the category
    pub category_attribute: String,

    /// Anchor (within an item) pointing at the product page
    pub link: String,

    /// Links containing this marker point at other listing pages and are skipped
    pub pagination_marker: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: "#products-listing-section ul li".to_string(),
            category: "section article".to_string(),
            category_attribute: "data-category".to_string(),
            link: "a[href]".to_string(),
            pagination_marker: "page=".to_string(),
        }
    }
}

/// Selectors locating product fields on a detail page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProductSelectors {
    pub name: String,
    pub description: String,

    /// One element per labelled attribute row
    pub attribute_row: String,
    pub attribute_label: String,
    pub attribute_value: String,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            name: "h1.fa226d.af6753.d582fb".to_string(),
            description: "p.d1cd7b.ca7db2.e2b79d".to_string(),
            attribute_row: "#section-descriptionAccordion div.ecc0f3".to_string(),
            attribute_label: "dt".to_string(),
            attribute_value: "dd".to_string(),
        }
    }
}
