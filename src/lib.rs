//! Listing-Sift: a marketplace listing extractor
//!
//! This crate fetches search, category and listing pages from the regional
//! eBay storefronts, normalises each listing into a fixed record schema and
//! fans the records out to JSON, CSV, XML and spreadsheet writers.

pub mod config;
pub mod crawler;
pub mod domain;
pub mod listing;
pub mod output;
pub mod parser;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Listing-Sift operations
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No output writer could be opened")]
    NoWriters,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown region code: {0}")]
    UnknownRegion(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Listing-Sift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use domain::{Domain, DomainRegistry};
pub use listing::{ListingDraft, ListingRecord};
pub use state::{RunState, TerminationCause};
