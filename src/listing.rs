//! Listing records
//!
//! Parsers fill a mutable [`ListingDraft`] field by field; [`ListingDraft::finish`]
//! normalises it once and produces an immutable [`ListingRecord`], or reports
//! why the fragment cannot become a record.

use crate::domain::Currency;
use crate::parser::ParseAnomaly;
use serde::{Deserialize, Serialize};

/// Listing fields as scraped, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDraft {
    pub url: Option<String>,
    pub item_number: Option<String>,
    pub categories: Vec<String>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub why_to_buy: Vec<String>,
    pub price: Option<f64>,
    pub was_price: Option<f64>,
    pub available: Option<u32>,
    pub available_text: Option<String>,
    pub sold: Option<u32>,
    pub image: Option<String>,
    pub seller: Option<String>,
    pub item_location: Option<String>,
    pub brand: Option<String>,
    pub ean: Option<String>,
    pub upc: Option<String>,
    pub mpn: Option<String>,
    pub listing_type: Option<String>,
}

impl ListingDraft {
    /// Validates and normalises the draft into a record
    ///
    /// Text fields are trimmed and empty strings become absent. `whyToBuy` is
    /// deduplicated keeping first occurrences. A was-price below the current
    /// price is dropped. The `*WithCurrency` fields are derived from the
    /// numeric prices and `currency`.
    ///
    /// # Errors
    ///
    /// * `ParseAnomaly::MissingUrl` - no listing URL
    /// * `ParseAnomaly::MissingItemNumber` - no item number
    /// * `ParseAnomaly::InvalidPrice` - negative or non-finite price
    pub fn finish(self, currency: &Currency) -> Result<ListingRecord, ParseAnomaly> {
        let url = non_empty(self.url).ok_or(ParseAnomaly::MissingUrl)?;
        let item_number = non_empty(self.item_number).ok_or_else(|| ParseAnomaly::MissingItemNumber {
            url: url.clone(),
        })?;

        let price = match self.price {
            Some(p) if !p.is_finite() || p < 0.0 => {
                return Err(ParseAnomaly::InvalidPrice { item_number });
            }
            other => other,
        };

        // Was-price only makes sense against a current price it exceeds
        let was_price = match (price, self.was_price) {
            (Some(p), Some(w)) if w.is_finite() && w >= p => Some(w),
            (Some(_), Some(w)) => {
                tracing::warn!(
                    "Dropping was-price {} below current price for item {}",
                    w,
                    item_number
                );
                None
            }
            _ => None,
        };

        let mut why_to_buy: Vec<String> = Vec::with_capacity(self.why_to_buy.len());
        for reason in self.why_to_buy.into_iter().filter_map(|r| non_empty(Some(r))) {
            if !why_to_buy.contains(&reason) {
                why_to_buy.push(reason);
            }
        }

        Ok(ListingRecord {
            url,
            item_number,
            categories: self
                .categories
                .into_iter()
                .filter_map(|c| non_empty(Some(c)))
                .collect(),
            title: non_empty(self.title).unwrap_or_default(),
            sub_title: non_empty(self.sub_title),
            why_to_buy,
            price,
            was_price,
            price_with_currency: price.map(|p| currency.format(p)),
            was_price_with_currency: was_price.map(|w| currency.format(w)),
            available: self.available,
            available_text: non_empty(self.available_text),
            sold: self.sold,
            image: non_empty(self.image),
            seller: non_empty(self.seller),
            item_location: non_empty(self.item_location),
            brand: non_empty(self.brand),
            ean: non_empty(self.ean),
            upc: non_empty(self.upc),
            mpn: non_empty(self.mpn),
            listing_type: non_empty(self.listing_type),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One normalised marketplace listing
///
/// Records are immutable once built; enrichment from the listing page
/// produces a new record via [`ListingRecord::enriched_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub(crate) url: String,
    pub(crate) item_number: String,
    #[serde(default)]
    pub(crate) categories: Vec<String>,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) sub_title: Option<String>,
    #[serde(default)]
    pub(crate) why_to_buy: Vec<String>,
    pub(crate) price: Option<f64>,
    pub(crate) was_price: Option<f64>,
    pub(crate) price_with_currency: Option<String>,
    pub(crate) was_price_with_currency: Option<String>,
    pub(crate) available: Option<u32>,
    pub(crate) available_text: Option<String>,
    pub(crate) sold: Option<u32>,
    pub(crate) image: Option<String>,
    pub(crate) seller: Option<String>,
    pub(crate) item_location: Option<String>,
    pub(crate) brand: Option<String>,
    pub(crate) ean: Option<String>,
    pub(crate) upc: Option<String>,
    pub(crate) mpn: Option<String>,
    #[serde(rename = "type")]
    pub(crate) listing_type: Option<String>,
}

impl ListingRecord {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn item_number(&self) -> &str {
        &self.item_number
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sub_title(&self) -> Option<&str> {
        self.sub_title.as_deref()
    }

    pub fn why_to_buy(&self) -> &[String] {
        &self.why_to_buy
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn was_price(&self) -> Option<f64> {
        self.was_price
    }

    pub fn price_with_currency(&self) -> Option<&str> {
        self.price_with_currency.as_deref()
    }

    pub fn was_price_with_currency(&self) -> Option<&str> {
        self.was_price_with_currency.as_deref()
    }

    pub fn available(&self) -> Option<u32> {
        self.available
    }

    pub fn available_text(&self) -> Option<&str> {
        self.available_text.as_deref()
    }

    pub fn sold(&self) -> Option<u32> {
        self.sold
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn seller(&self) -> Option<&str> {
        self.seller.as_deref()
    }

    pub fn item_location(&self) -> Option<&str> {
        self.item_location.as_deref()
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn ean(&self) -> Option<&str> {
        self.ean.as_deref()
    }

    pub fn upc(&self) -> Option<&str> {
        self.upc.as_deref()
    }

    pub fn mpn(&self) -> Option<&str> {
        self.mpn.as_deref()
    }

    pub fn listing_type(&self) -> Option<&str> {
        self.listing_type.as_deref()
    }

    /// Merges fields scraped from the listing's own page
    ///
    /// Non-empty values from `detail` replace the card values for
    /// categories, seller, location, brand, identifiers and type. Prices,
    /// availability and identity are kept from the search card.
    pub fn enriched_with(mut self, detail: &ListingDraft) -> Self {
        fn replace(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = non_empty(value.clone()) {
                *slot = Some(v);
            }
        }

        let categories: Vec<String> = detail
            .categories
            .iter()
            .filter_map(|c| non_empty(Some(c.clone())))
            .collect();
        if !categories.is_empty() {
            self.categories = categories;
        }

        replace(&mut self.seller, &detail.seller);
        replace(&mut self.item_location, &detail.item_location);
        replace(&mut self.brand, &detail.brand);
        replace(&mut self.ean, &detail.ean);
        replace(&mut self.upc, &detail.upc);
        replace(&mut self.mpn, &detail.mpn);
        replace(&mut self.listing_type, &detail.listing_type);
        if self.sub_title.is_none() {
            replace(&mut self.sub_title, &detail.sub_title);
        }
        self
    }
}
