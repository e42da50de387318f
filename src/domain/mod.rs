//! Domain Registry for Listing-Sift
//!
//! Each regional storefront is described by a [`Domain`]: its base URL, the
//! currency prices are quoted in, the locale vocabulary its markup uses and
//! the parser strategy that understands that markup.

pub mod locale;
mod registry;

pub use locale::Locale;
pub use registry::DomainRegistry;

use crate::parser::PageParser;
use crate::url::matches_host_pattern;
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A regional storefront code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    US,
    UK,
    DE,
    AU,
    CA,
    IN,
    FR,
    IT,
    ES,
    NL,
}

impl Region {
    /// Every supported region, in registry order
    pub const ALL: [Region; 10] = [
        Region::US,
        Region::UK,
        Region::DE,
        Region::AU,
        Region::CA,
        Region::IN,
        Region::FR,
        Region::IT,
        Region::ES,
        Region::NL,
    ];

    /// Returns the canonical two-letter code
    pub fn code(&self) -> &'static str {
        match self {
            Region::US => "US",
            Region::UK => "UK",
            Region::DE => "DE",
            Region::AU => "AU",
            Region::CA => "CA",
            Region::IN => "IN",
            Region::FR => "FR",
            Region::IT => "IT",
            Region::ES => "ES",
            Region::NL => "NL",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Region::US),
            "UK" | "GB" => Ok(Region::UK),
            "DE" => Ok(Region::DE),
            "AU" => Ok(Region::AU),
            "CA" => Ok(Region::CA),
            "IN" => Ok(Region::IN),
            "FR" => Ok(Region::FR),
            "IT" => Ok(Region::IT),
            "ES" => Ok(Region::ES),
            "NL" => Ok(Region::NL),
            _ => Err(ConfigError::UnknownRegion(s.to_string())),
        }
    }
}

/// The currency a storefront quotes prices in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    /// ISO 4217 code, e.g. `EUR`
    pub code: &'static str,

    /// Symbol as printed in listing markup, e.g. `€`
    pub symbol: &'static str,
}

impl Currency {
    /// Formats an amount the way `priceWithCurrency` fields are written
    ///
    /// # Examples
    ///
    /// ```
    /// use listing_sift::domain::Currency;
    ///
    /// let usd = Currency { code: "USD", symbol: "$" };
    /// assert_eq!(usd.format(39.0), "USD 39.00");
    /// ```
    pub fn format(&self, amount: f64) -> String {
        format!("{} {:.2}", self.code, amount)
    }
}

/// A regional storefront and the strategy used to parse its pages
#[derive(Debug, Clone)]
pub struct Domain {
    /// Region code this domain serves
    pub region: Region,

    /// Scheme and host of the storefront, without trailing slash
    pub base_url: &'static str,

    /// Currency prices on this storefront are quoted in
    pub currency: Currency,

    /// Label vocabulary and number conventions
    pub locale: &'static Locale,

    /// Host patterns (see [`matches_host_pattern`]) served by this domain
    pub hosts: &'static [&'static str],

    parser: Arc<dyn PageParser>,
}

impl Domain {
    /// Creates a domain with the given markup strategy
    pub fn new(
        region: Region,
        base_url: &'static str,
        currency: Currency,
        locale: &'static Locale,
        hosts: &'static [&'static str],
        parser: Arc<dyn PageParser>,
    ) -> Self {
        Self {
            region,
            base_url,
            currency,
            locale,
            hosts,
            parser,
        }
    }

    /// Returns the markup strategy for this domain
    pub fn parser(&self) -> &dyn PageParser {
        self.parser.as_ref()
    }

    /// Checks whether a lowercase host belongs to this domain
    pub fn serves_host(&self, host: &str) -> bool {
        self.hosts
            .iter()
            .any(|pattern| matches_host_pattern(pattern, host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parse_is_case_insensitive() {
        assert_eq!("us".parse::<Region>().unwrap(), Region::US);
        assert_eq!(" De ".parse::<Region>().unwrap(), Region::DE);
    }

    #[test]
    fn test_gb_is_an_alias_for_uk() {
        assert_eq!("GB".parse::<Region>().unwrap(), Region::UK);
        assert_eq!(Region::UK.to_string(), "UK");
    }

    #[test]
    fn test_unknown_region_keeps_input() {
        match "XX".parse::<Region>() {
            Err(ConfigError::UnknownRegion(code)) => assert_eq!(code, "XX"),
            other => panic!("expected UnknownRegion, got {:?}", other),
        }
    }

    #[test]
    fn test_region_codes_round_trip() {
        for region in Region::ALL {
            assert_eq!(region.code().parse::<Region>().unwrap(), region);
        }
    }

    #[test]
    fn test_currency_format_uses_two_decimals() {
        let eur = Currency {
            code: "EUR",
            symbol: "€",
        };
        assert_eq!(eur.format(41.05), "EUR 41.05");
        assert_eq!(eur.format(1234.5), "EUR 1234.50");
    }
}
