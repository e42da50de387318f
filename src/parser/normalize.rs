//! Text, price and quantity normalisation
//!
//! Listing markup renders the same facts differently per storefront:
//! `$1,299.99`, `EUR 1.299,99`, `1 299,99 €`; "More than 10 available",
//! "Mehr als 10 verfügbar". These helpers turn that text into numbers.

use crate::domain::Locale;
use regex::Regex;

/// A price split into its currency text and amount
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    /// Currency symbol or code as printed (`$`, `EUR`, `£`), if any
    pub currency: Option<String>,

    /// Numeric amount in major units
    pub amount: f64,
}

/// Collapses runs of whitespace (including non-breaking spaces) and trims
pub fn clean_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes a leading badge label such as "New Listing" from a title
///
/// Matching is case-insensitive. The label is often rendered in its own
/// span with no separating space, so "New ListingDesk Lamp" becomes
/// "Desk Lamp".
pub fn strip_leading_labels(title: &str, labels: &[&str]) -> String {
    let title = clean_text(title);
    for label in labels {
        let prefix_len = label.len();
        if title.len() >= prefix_len
            && title.is_char_boundary(prefix_len)
            && title[..prefix_len].eq_ignore_ascii_case(label)
        {
            return title[prefix_len..].trim().to_string();
        }
    }
    title
}

/// Parses a price as printed on a listing
///
/// For ranges ("$10.00 to $20.00") the lower bound is returned. Returns
/// `None` when the text holds no number.
///
/// # Examples
///
/// ```
/// use listing_sift::domain::locale::{ENGLISH, GERMAN};
/// use listing_sift::parser::parse_price;
///
/// let price = parse_price("$1,299.99", &ENGLISH).unwrap();
/// assert_eq!(price.amount, 1299.99);
/// assert_eq!(price.currency.as_deref(), Some("$"));
///
/// let price = parse_price("EUR 1.299,99", &GERMAN).unwrap();
/// assert_eq!(price.amount, 1299.99);
/// ```
pub fn parse_price(text: &str, locale: &Locale) -> Option<ParsedPrice> {
    let text = clean_text(text);
    let start = text.find(|c: char| c.is_ascii_digit())?;

    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ' ' | '\u{202f}'))
        .collect();
    let amount = parse_decimal(number.trim(), locale.decimal_comma)?;

    let prefix = text[..start].trim();
    let currency = if prefix.is_empty() {
        // Suffix notation: "39,00 €" or "39,00 EUR"
        let rest = text[start + number.len()..].trim();
        rest.split_whitespace().next().map(str::to_string)
    } else {
        Some(prefix.to_string())
    };

    Some(ParsedPrice { currency, amount })
}

/// Parses a decimal number with locale-specific separators
///
/// With `decimal_comma`, `.` and spaces group thousands and `,` separates
/// decimals; otherwise `,` and spaces group thousands.
pub fn parse_decimal(number: &str, decimal_comma: bool) -> Option<f64> {
    let mut normalized = String::with_capacity(number.len());
    for c in number.chars() {
        match c {
            '0'..='9' => normalized.push(c),
            ',' if decimal_comma => normalized.push('.'),
            '.' if !decimal_comma => normalized.push('.'),
            _ => {}
        }
    }
    normalized.parse::<f64>().ok()
}

/// Parses an integer count that may contain thousands separators
pub fn parse_count(number: &str) -> Option<u32> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Compiled availability and sold-count matchers for one locale
#[derive(Debug)]
pub struct QuantityPatterns {
    available: Option<Regex>,
    sold: Option<Regex>,
    last_one_phrases: &'static [&'static str],
}

impl QuantityPatterns {
    /// Compiles the matchers for a locale's vocabulary
    pub fn new(locale: &'static Locale) -> Self {
        Self {
            available: count_followed_by(locale.available_words),
            sold: count_followed_by(locale.sold_words),
            last_one_phrases: locale.last_one_phrases,
        }
    }

    /// Best-effort available quantity from availability text
    ///
    /// Recognises "N available", "More than N available" (yielding N) and
    /// the locale's "last one" phrases (yielding 1). Anything else yields
    /// `None`; callers keep the raw text.
    pub fn available(&self, text: &str) -> Option<u32> {
        let lowered = text.to_lowercase();
        if self
            .last_one_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase))
        {
            return Some(1);
        }
        capture_count(self.available.as_ref()?, text)
    }

    /// Sold count from text such as "1,234 sold" or "25+ verkauft"
    pub fn sold(&self, text: &str) -> Option<u32> {
        capture_count(self.sold.as_ref()?, text)
    }
}

fn count_followed_by(words: &[&str]) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    let pattern = format!(r"(?i)(\d[\d.,\u{{a0}}\u{{202f}}]*)\+?\s*(?:{})\b", alternatives.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid quantity pattern {}: {}", pattern, e);
            None
        }
    }
}

fn capture_count(re: &Regex, text: &str) -> Option<u32> {
    let caps = re.captures(text)?;
    parse_count(caps.get(1)?.as_str())
}
