use url::Url;

/// Minimum number of digits in a marketplace item number
const MIN_ITEM_NUMBER_DIGITS: usize = 9;

/// Strips query and fragment from a listing URL
///
/// Listing links on result pages carry per-impression tracking; the bare
/// path is stable and unique per listing within a domain.
pub fn canonical_listing_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Extracts the item number from a listing URL
///
/// Looks for a path segment made of at least nine digits
/// (`/itm/123456789012` or `/itm/some-title/123456789012`), then for an
/// `item` query parameter.
///
/// # Examples
///
/// ```
/// use listing_sift::url::extract_item_number;
/// use url::Url;
///
/// let url = Url::parse("https://www.ebay.com/itm/Desk-Lamp/256123456789?hash=x").unwrap();
/// assert_eq!(extract_item_number(&url), Some("256123456789".to_string()));
/// ```
pub fn extract_item_number(url: &Url) -> Option<String> {
    let from_path = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| is_item_number(s)).last())
        .map(str::to_string);

    from_path.or_else(|| {
        url.query_pairs()
            .find(|(k, v)| (k == "item" || k == "itm") && is_item_number(v))
            .map(|(_, v)| v.into_owned())
    })
}

/// Checks that a string looks like an item number
pub fn is_item_number(candidate: &str) -> bool {
    candidate.len() >= MIN_ITEM_NUMBER_DIGITS && candidate.chars().all(|c| c.is_ascii_digit())
}
