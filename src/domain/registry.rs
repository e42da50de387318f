use super::locale::{DUTCH, ENGLISH, FRENCH, GERMAN, ITALIAN, SPANISH};
use super::{Currency, Domain, Locale, Region};
use crate::parser::{EbayMarkup, PageParser};
use crate::url::host_of;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

const USD: Currency = Currency { code: "USD", symbol: "$" };
const GBP: Currency = Currency { code: "GBP", symbol: "£" };
const EUR: Currency = Currency { code: "EUR", symbol: "€" };
const AUD: Currency = Currency { code: "AUD", symbol: "AU $" };
const CAD: Currency = Currency { code: "CAD", symbol: "C $" };
const INR: Currency = Currency { code: "INR", symbol: "Rs." };

/// Static description of one storefront
struct DomainEntry {
    region: Region,
    base_url: &'static str,
    currency: Currency,
    locale: &'static Locale,
    hosts: &'static [&'static str],
}

static ENTRIES: &[DomainEntry] = &[
    DomainEntry {
        region: Region::US,
        base_url: "https://www.ebay.com",
        currency: USD,
        locale: &ENGLISH,
        hosts: &["*.ebay.com"],
    },
    DomainEntry {
        region: Region::UK,
        base_url: "https://www.ebay.co.uk",
        currency: GBP,
        locale: &ENGLISH,
        hosts: &["*.ebay.co.uk"],
    },
    DomainEntry {
        region: Region::DE,
        base_url: "https://www.ebay.de",
        currency: EUR,
        locale: &GERMAN,
        hosts: &["*.ebay.de"],
    },
    DomainEntry {
        region: Region::AU,
        base_url: "https://www.ebay.com.au",
        currency: AUD,
        locale: &ENGLISH,
        hosts: &["*.ebay.com.au"],
    },
    DomainEntry {
        region: Region::CA,
        base_url: "https://www.ebay.ca",
        currency: CAD,
        locale: &ENGLISH,
        hosts: &["*.ebay.ca"],
    },
    DomainEntry {
        region: Region::IN,
        base_url: "https://www.ebay.in",
        currency: INR,
        locale: &ENGLISH,
        hosts: &["*.ebay.in"],
    },
    DomainEntry {
        region: Region::FR,
        base_url: "https://www.ebay.fr",
        currency: EUR,
        locale: &FRENCH,
        hosts: &["*.ebay.fr"],
    },
    DomainEntry {
        region: Region::IT,
        base_url: "https://www.ebay.it",
        currency: EUR,
        locale: &ITALIAN,
        hosts: &["*.ebay.it"],
    },
    DomainEntry {
        region: Region::ES,
        base_url: "https://www.ebay.es",
        currency: EUR,
        locale: &SPANISH,
        hosts: &["*.ebay.es"],
    },
    DomainEntry {
        region: Region::NL,
        base_url: "https://www.benl.ebay.be",
        currency: EUR,
        locale: &DUTCH,
        hosts: &["*.benl.ebay.be", "*.ebay.nl"],
    },
];

/// Maps region codes and hosts to [`Domain`]s
///
/// Domains are shared as `Arc`s so in-flight page tasks can hold on to the
/// domain of the input they belong to.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: HashMap<Region, Arc<Domain>>,
}

impl DomainRegistry {
    /// Builds the registry of every supported storefront
    ///
    /// Storefronts sharing a locale share one parser strategy instance.
    pub fn standard() -> Self {
        let mut strategies: HashMap<&'static str, Arc<dyn PageParser>> = HashMap::new();
        let mut domains = HashMap::new();

        for entry in ENTRIES {
            let parser = strategies
                .entry(entry.locale.tag)
                .or_insert_with(|| Arc::new(EbayMarkup::new(entry.locale)) as Arc<dyn PageParser>)
                .clone();

            let domain = Domain::new(
                entry.region,
                entry.base_url,
                entry.currency,
                entry.locale,
                entry.hosts,
                parser,
            );
            domains.insert(entry.region, Arc::new(domain));
        }

        Self { domains }
    }

    /// Returns the domain for a region
    pub fn get(&self, region: Region) -> Option<Arc<Domain>> {
        self.domains.get(&region).cloned()
    }

    /// Finds the domain whose host patterns match `host`
    pub fn region_for_host(&self, host: &str) -> Option<Region> {
        let host = host.to_ascii_lowercase();
        Region::ALL
            .iter()
            .copied()
            .find(|region| {
                self.domains
                    .get(region)
                    .map(|d| d.serves_host(&host))
                    .unwrap_or(false)
            })
    }

    /// Resolves the domain serving `url`, falling back to `fallback`
    ///
    /// Input URLs on hosts outside the registry (mirrors, local fixtures) are
    /// parsed with the fallback region's strategy.
    pub fn resolve(&self, url: &Url, fallback: Region) -> Option<Arc<Domain>> {
        let region = match host_of(url).and_then(|host| self.region_for_host(&host)) {
            Some(region) => region,
            None => {
                tracing::warn!(
                    "Host of {} is not a known storefront, using region {}",
                    url,
                    fallback
                );
                fallback
            }
        };
        self.get(region)
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_region_is_registered() {
        let registry = DomainRegistry::standard();
        for region in Region::ALL {
            let domain = registry.get(region).unwrap();
            assert_eq!(domain.region, region);
            assert!(domain.base_url.starts_with("https://"));
        }
    }

    #[test]
    fn test_region_for_host() {
        let registry = DomainRegistry::standard();
        assert_eq!(registry.region_for_host("www.ebay.com"), Some(Region::US));
        assert_eq!(registry.region_for_host("www.ebay.com.au"), Some(Region::AU));
        assert_eq!(registry.region_for_host("WWW.EBAY.CO.UK"), Some(Region::UK));
        assert_eq!(registry.region_for_host("www.benl.ebay.be"), Some(Region::NL));
        assert_eq!(registry.region_for_host("example.com"), None);
    }

    #[test]
    fn test_currency_and_locale_follow_region() {
        let registry = DomainRegistry::standard();

        let de = registry.get(Region::DE).unwrap();
        assert_eq!(de.currency.code, "EUR");
        assert!(de.locale.decimal_comma);

        let uk = registry.get(Region::UK).unwrap();
        assert_eq!(uk.currency.code, "GBP");
        assert!(!uk.locale.decimal_comma);
    }

    #[test]
    fn test_resolve_falls_back_for_unknown_host() {
        let registry = DomainRegistry::standard();

        let url = Url::parse("http://127.0.0.1:9000/sch/i.html").unwrap();
        assert_eq!(registry.resolve(&url, Region::FR).unwrap().region, Region::FR);

        let url = Url::parse("https://www.ebay.it/sch/i.html").unwrap();
        assert_eq!(registry.resolve(&url, Region::US).unwrap().region, Region::IT);
    }
}
