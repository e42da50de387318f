//! Page Parser for Listing-Sift
//!
//! This module turns fetched markup into normalised listing records:
//! - Search and category pages yield many records plus a next-page link
//! - Listing pages yield a single record, or enrichment for a card record
//! - Prices, quantities and labels are normalised per locale
//!
//! Parsing never fails as a whole. A card that cannot become a record is
//! reported as a [`ParseAnomaly`] and its siblings are still returned.

mod dom;
mod item;
mod markup;
mod normalize;
mod search;

pub use markup::EbayMarkup;
pub use normalize::{
    clean_text, parse_count, parse_decimal, parse_price, strip_leading_labels, ParsedPrice,
    QuantityPatterns,
};

use crate::crawler::RawPage;
use crate::domain::Domain;
use crate::listing::{ListingDraft, ListingRecord};
use std::fmt;
use thiserror::Error;
use url::Url;

/// A listing fragment that could not become a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseAnomaly {
    #[error("listing has no URL")]
    MissingUrl,

    #[error("listing {url} has no item number")]
    MissingItemNumber { url: String },

    #[error("listing {item_number} has an invalid price")]
    InvalidPrice { item_number: String },
}

/// Result of parsing a search or category page
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Records in page order
    pub records: Vec<ListingRecord>,

    /// Cards skipped because they could not be normalised
    pub anomalies: Vec<ParseAnomaly>,

    /// Next result page of the same input, if the page links one
    pub next_page: Option<Url>,
}

/// Markup strategy for one family of storefront pages
///
/// A [`Domain`] carries the strategy matching its markup; callers select it
/// by region, never by inspecting the page.
pub trait PageParser: Send + Sync + fmt::Debug {
    /// Extracts listing cards and the next-page link from a result page
    fn parse_search(&self, page: &RawPage, domain: &Domain) -> ParsedPage;

    /// Extracts every field a listing page offers
    fn parse_item(&self, page: &RawPage, domain: &Domain) -> ListingDraft;
}

/// Parses a search or category page with the domain's strategy
pub fn parse(page: &RawPage, domain: &Domain) -> ParsedPage {
    domain.parser().parse_search(page, domain)
}

/// Parses a listing page into a single record
pub fn parse_listing(page: &RawPage, domain: &Domain) -> Result<ListingRecord, ParseAnomaly> {
    domain
        .parser()
        .parse_item(page, domain)
        .finish(&domain.currency)
}
