use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Main configuration structure for Listing-Sift
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub proxies: ProxyConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Pipeline limits and behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScraperConfig {
    /// Maximum number of records emitted across the whole run
    pub max_items: u32,

    /// Worker pool size: maximum number of concurrent fetches
    pub concurrency: u32,

    /// Maximum number of result pages fetched per search input
    pub max_pages_per_input: u32,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Number of fatal fetch failures after which the run stops
    pub max_fatal_errors: u32,

    /// Fetch each listing's own page to fill categories, identifiers and specifics
    pub follow_item_page: bool,

    /// Minimum delay between consecutive pages of one input (milliseconds)
    pub page_delay_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_items: 200,
            concurrency: 4,
            max_pages_per_input: 50,
            timeout_secs: 20,
            max_fatal_errors: 10,
            follow_item_page: false,
            page_delay_ms: 500,
        }
    }
}

/// Retry policy for transient fetch failures
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles per attempt (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// HTTP client identification
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProxyConfig {
    /// Ordered proxy endpoints; empty means direct connections
    pub pool: Vec<String>,

    /// Rotate round-robin through the pool; when false only the first entry is used
    pub rotate: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            pool: Vec::new(),
            rotate: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory receiving the output files
    pub directory: String,

    /// File name stem shared by every writer
    pub basename: String,

    /// Append a `_YYYYmmdd-HHMMSS` suffix to the stem
    pub timestamped: bool,

    /// Enabled writers
    pub formats: Vec<OutputFormat>,

    /// Optional path of a markdown run report
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./data".to_string(),
            basename: "listings".to_string(),
            timestamped: true,
            formats: vec![OutputFormat::Json, OutputFormat::Csv],
            summary_path: None,
        }
    }
}

impl OutputConfig {
    /// Drops repeated formats, keeping the first mention of each
    ///
    /// Aliases name the same format, so `["excel", "xlsx"]` collapses to one
    /// spreadsheet writer.
    pub fn dedup_formats(&mut self) {
        let mut seen = HashSet::new();
        self.formats.retain(|format| seen.insert(*format));
    }
}

/// Supported output writers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Xml,
    #[serde(alias = "excel", alias = "xlsx")]
    Spreadsheet,
}

impl OutputFormat {
    /// File extension (without the leading dot) used for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
            Self::Spreadsheet => "spreadsheet.xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
            Self::Spreadsheet => "spreadsheet",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            "spreadsheet" | "excel" | "xlsx" => Ok(Self::Spreadsheet),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Inputs: what to scrape and where
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InputConfig {
    /// Region codes keywords are searched in (e.g. "US", "DE")
    pub regions: Vec<String>,

    /// Search or category result URLs
    pub urls: Vec<String>,

    /// Keywords searched once per configured region
    pub keywords: Vec<String>,

    /// Individual listing pages
    pub listing_urls: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            regions: vec!["US".to_string()],
            urls: Vec::new(),
            keywords: Vec::new(),
            listing_urls: Vec::new(),
        }
    }
}

impl InputConfig {
    /// Returns true when no URL, keyword or listing input is configured
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.keywords.is_empty() && self.listing_urls.is_empty()
    }
}
