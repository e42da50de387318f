use super::normalize::{parse_http_url, set_query_pairs, strip_tracking_params};
use crate::UrlError;
use url::Url;

/// Query parameter carrying the 1-based result page number
pub const PAGE_PARAM: &str = "_pgn";

/// Query parameter carrying the number of results per page
pub const PAGE_SIZE_PARAM: &str = "_ipg";

/// Page size requested when a search URL does not specify one
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 60;

/// Builds the search URL for a keyword on a marketplace domain
///
/// # Examples
///
/// ```
/// use listing_sift::url::keyword_to_url;
///
/// let url = keyword_to_url("https://www.ebay.com", "desk lamp").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.ebay.com/sch/i.html?_ipg=60&_nkw=desk+lamp&_pgn=1"
/// );
/// ```
pub fn keyword_to_url(base_url: &str, keyword: &str) -> Result<Url, UrlError> {
    let mut url = parse_http_url(base_url)?;
    url.set_path("/sch/i.html");
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("_nkw", keyword.trim());
    Ok(normalize_search_url(&url))
}

/// Makes pagination explicit and removes volatile tracking parameters
///
/// Missing `_pgn` becomes `1` and missing `_ipg` becomes the default page
/// size, so every page of one input differs only in `_pgn`.
pub fn normalize_search_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    strip_tracking_params(&mut url);

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !params.iter().any(|(k, _)| k == PAGE_PARAM) {
        params.push((PAGE_PARAM.to_string(), "1".to_string()));
    }
    if !params.iter().any(|(k, _)| k == PAGE_SIZE_PARAM) {
        params.push((PAGE_SIZE_PARAM.to_string(), DEFAULT_ITEMS_PER_PAGE.to_string()));
    }

    params.sort_by(|a, b| a.0.cmp(&b.0));
    set_query_pairs(&mut url, &params);
    url
}

/// Returns a copy of `url` pointing at the given result page
pub fn set_page(url: &Url, page: u32) -> Url {
    let mut url = url.clone();
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != PAGE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.push((PAGE_PARAM.to_string(), page.to_string()));
    params.sort_by(|a, b| a.0.cmp(&b.0));
    set_query_pairs(&mut url, &params);
    url
}

/// Reads the result page number from a search URL (1 when absent or invalid)
pub fn page_number(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(k, _)| k == PAGE_PARAM)
        .and_then(|(_, v)| v.parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}
