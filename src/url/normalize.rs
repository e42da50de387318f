use crate::UrlError;
use url::Url;

/// Query parameters that only carry click tracking and never change results
const TRACKING_PARAMS: &[&str] = &[
    "_trksid",
    "_trkparms",
    "_from",
    "hash",
    "campid",
    "customid",
    "mkcid",
    "mkevt",
    "mkrid",
    "toolid",
    "fbclid",
    "gclid",
];

/// Parses a URL and checks it is an absolute HTTP(S) URL with a host
///
/// # Examples
///
/// ```
/// use listing_sift::url::parse_http_url;
///
/// assert!(parse_http_url("https://www.ebay.com/sch/i.html").is_ok());
/// assert!(parse_http_url("mailto:someone@example.com").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves an `href` found in page markup against the page URL
///
/// Returns None if the link should be ignored:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only links
/// - anything that does not resolve to HTTP(S)
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute)
    } else {
        None
    }
}

/// Removes tracking parameters and sorts what remains so equal searches
/// produce identical URLs
pub fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    set_query_pairs(url, &params);
}

/// Replaces the query string with the given pairs, dropping an empty `?`
pub(crate) fn set_query_pairs(url: &mut Url, params: &[(String, String)]) {
    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();

    // Telemetry keys on search pages all start with "rt" (rt=nc, rt_...)
    TRACKING_PARAMS.contains(&lower.as_str()) || lower.starts_with("utm_") || lower.starts_with("rt")
}
