//! URL handling module for Listing-Sift
//!
//! This module builds and normalises search URLs, manages the pagination
//! parameters, canonicalises listing URLs and extracts item numbers.

mod host;
mod listing;
mod normalize;
mod search;

// Re-export main functions
pub use host::{host_of, matches_host_pattern};
pub use listing::{canonical_listing_url, extract_item_number, is_item_number};
pub use normalize::{parse_http_url, resolve_href, strip_tracking_params};
pub use search::{
    keyword_to_url, normalize_search_url, page_number, set_page, DEFAULT_ITEMS_PER_PAGE,
    PAGE_PARAM, PAGE_SIZE_PARAM,
};
