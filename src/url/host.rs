use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use listing_sift::url::host_of;
///
/// let url = Url::parse("https://WWW.EBAY.DE/sch/i.html").unwrap();
/// assert_eq!(host_of(&url), Some("www.ebay.de".to_string()));
/// ```
pub fn host_of(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host matches a domain pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "ebay.com" matches only "ebay.com"
/// 2. Wildcard match: "*.ebay.com" matches "ebay.com", "www.ebay.com" and
///    any deeper subdomain, but not "ebay.com.au"
pub fn matches_host_pattern(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}
