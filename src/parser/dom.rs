use super::normalize::clean_text;
use scraper::{ElementRef, Selector};

/// Parses a list of CSS selectors, skipping (and logging) invalid ones
pub(crate) fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::error!("Invalid selector {:?}: {:?}", s, e);
                None
            }
        })
        .collect()
}

/// Collapsed text content of an element
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Text of the first non-empty match, trying selectors in order
pub(crate) fn first_text(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        scope
            .select(selector)
            .map(text_of)
            .find(|text| !text.is_empty())
    })
}

/// Attribute value of the first match carrying it, trying selectors in order
pub(crate) fn first_attr(
    scope: ElementRef<'_>,
    selectors: &[Selector],
    attr: &str,
) -> Option<String> {
    selectors.iter().find_map(|selector| {
        scope
            .select(selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Non-empty texts of every match of every selector, in document order per selector
pub(crate) fn all_texts(scope: ElementRef<'_>, selectors: &[Selector]) -> Vec<String> {
    selectors
        .iter()
        .flat_map(|selector| scope.select(selector).map(text_of))
        .filter(|text| !text.is_empty())
        .collect()
}
