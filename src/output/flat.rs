//! Flat (one row per record) representation shared by the CSV, XML and
//! spreadsheet formats

use super::traits::{OutputError, OutputResult};
use crate::listing::ListingRecord;
use std::collections::HashMap;

/// Column names in output order
pub const COLUMNS: &[&str] = &[
    "url",
    "itemNumber",
    "categories",
    "title",
    "subTitle",
    "whyToBuy",
    "price",
    "wasPrice",
    "priceWithCurrency",
    "wasPriceWithCurrency",
    "available",
    "availableText",
    "sold",
    "image",
    "seller",
    "itemLocation",
    "brand",
    "ean",
    "upc",
    "mpn",
    "type",
];

pub const CATEGORY_SEPARATOR: &str = " > ";
pub const REASON_SEPARATOR: &str = " | ";

/// Renders a record as one cell per column, absent values as empty strings
pub fn to_row(record: &ListingRecord) -> Vec<String> {
    fn opt(value: Option<&str>) -> String {
        value.unwrap_or_default().to_string()
    }
    fn num<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    vec![
        record.url().to_string(),
        record.item_number().to_string(),
        record.categories().join(CATEGORY_SEPARATOR),
        record.title().to_string(),
        opt(record.sub_title()),
        record.why_to_buy().join(REASON_SEPARATOR),
        num(record.price()),
        num(record.was_price()),
        opt(record.price_with_currency()),
        opt(record.was_price_with_currency()),
        num(record.available()),
        opt(record.available_text()),
        num(record.sold()),
        opt(record.image()),
        opt(record.seller()),
        opt(record.item_location()),
        opt(record.brand()),
        opt(record.ean()),
        opt(record.upc()),
        opt(record.mpn()),
        opt(record.listing_type()),
    ]
}

/// Rebuilds a record from column name → cell text
///
/// Empty cells read back as absent values; `categories` and `whyToBuy` are
/// split on their separators.
pub fn record_from_fields(fields: &HashMap<String, String>) -> OutputResult<ListingRecord> {
    let text = |column: &str| -> Option<String> {
        fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let list = |column: &str, separator: &str| -> Vec<String> {
        text(column)
            .map(|v| {
                v.split(separator)
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    let url = text("url").ok_or_else(|| OutputError::Format("row without url".to_string()))?;
    let item_number = text("itemNumber")
        .ok_or_else(|| OutputError::Format(format!("row without itemNumber: {}", url)))?;

    Ok(ListingRecord {
        categories: list("categories", CATEGORY_SEPARATOR),
        title: text("title").unwrap_or_default(),
        sub_title: text("subTitle"),
        why_to_buy: list("whyToBuy", REASON_SEPARATOR),
        price: parse_number(text("price"), "price")?,
        was_price: parse_number(text("wasPrice"), "wasPrice")?,
        price_with_currency: text("priceWithCurrency"),
        was_price_with_currency: text("wasPriceWithCurrency"),
        available: parse_number(text("available"), "available")?,
        available_text: text("availableText"),
        sold: parse_number(text("sold"), "sold")?,
        image: text("image"),
        seller: text("seller"),
        item_location: text("itemLocation"),
        brand: text("brand"),
        ean: text("ean"),
        upc: text("upc"),
        mpn: text("mpn"),
        listing_type: text("type"),
        url,
        item_number,
    })
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, column: &str) -> OutputResult<Option<T>> {
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| OutputError::Format(format!("invalid {} value: {}", column, v)))
        })
        .transpose()
}
