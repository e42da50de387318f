use super::dom::{all_texts, first_attr, first_text, text_of};
use super::markup::{CardLayout, EbayMarkup};
use super::normalize::{parse_price, strip_leading_labels};
use super::{ParseAnomaly, ParsedPage};
use crate::crawler::RawPage;
use crate::domain::Domain;
use crate::listing::{ListingDraft, ListingRecord};
use crate::url::{
    canonical_listing_url, extract_item_number, is_item_number, normalize_search_url,
    page_number, resolve_href,
};
use scraper::{ElementRef, Html};
use url::Url;

/// Path of the sponsored placeholder card result pages start with
const PLACEHOLDER_ITEM_PATH: &str = "/itm/123456";

pub(crate) fn parse_search_page(markup: &EbayMarkup, page: &RawPage, domain: &Domain) -> ParsedPage {
    let document = Html::parse_document(&page.body);
    let root = document.root_element();
    let mut parsed = ParsedPage {
        next_page: next_page_link(markup, root, &page.url),
        ..Default::default()
    };

    let Some((layout, cards)) = markup.layouts.iter().find_map(|layout| {
        let cards = find_cards(root, layout);
        (!cards.is_empty()).then_some((layout, cards))
    }) else {
        tracing::debug!("No listing cards found on {}", page.url);
        return parsed;
    };

    tracing::debug!(
        "Found {} {} cards on {}",
        cards.len(),
        layout.name,
        page.url
    );

    for card in cards {
        match parse_card(markup, layout, card, &page.url, domain) {
            Some(Ok(record)) => parsed.records.push(record),
            Some(Err(anomaly)) => {
                tracing::warn!("Skipping listing on {}: {}", page.url, anomaly);
                parsed.anomalies.push(anomaly);
            }
            None => {}
        }
    }

    parsed
}

/// Cards matched by the first card selector that matches anything
fn find_cards<'a>(root: ElementRef<'a>, layout: &CardLayout) -> Vec<ElementRef<'a>> {
    layout
        .cards
        .iter()
        .map(|selector| root.select(selector).collect::<Vec<_>>())
        .find(|cards| !cards.is_empty())
        .unwrap_or_default()
}

/// Builds a record from one card
///
/// Returns `None` for placeholder cards that are not listings at all.
fn parse_card(
    markup: &EbayMarkup,
    layout: &CardLayout,
    card: ElementRef<'_>,
    page_url: &Url,
    domain: &Domain,
) -> Option<Result<ListingRecord, ParseAnomaly>> {
    let link = first_attr(card, &layout.link, "href").and_then(|href| resolve_href(&href, page_url));

    if link
        .as_ref()
        .map(|url| url.path() == PLACEHOLDER_ITEM_PATH)
        .unwrap_or(false)
    {
        return None;
    }

    let item_number = card
        .value()
        .attr("data-listingid")
        .map(str::trim)
        .filter(|id| is_item_number(id))
        .map(str::to_string)
        .or_else(|| link.as_ref().and_then(extract_item_number));

    let title = first_text(card, &layout.title)
        .or_else(|| first_attr(card, &layout.image, "alt"))
        .map(|t| strip_leading_labels(&t, markup.locale.new_listing_labels));

    let price = first_text(card, &layout.price).and_then(|t| parse_price(&t, markup.locale));
    if let Some(currency) = price.as_ref().and_then(|p| p.currency.as_deref()) {
        if !currency.contains(domain.currency.code) && !currency.contains(domain.currency.symbol.trim()) {
            tracing::debug!(
                "Price currency {:?} differs from {} on {}",
                currency,
                domain.currency.code,
                page_url
            );
        }
    }
    let was_price = first_text(card, &layout.was_price).and_then(|t| parse_price(&t, markup.locale));

    let available_text = first_text(card, &layout.availability);
    let available = available_text
        .as_deref()
        .and_then(|t| markup.quantities.available(t));
    let sold = all_texts(card, &layout.sold)
        .iter()
        .find_map(|t| markup.quantities.sold(t));

    // Hotness doubles as sold count; only non-count text is a selling point
    let why_to_buy = all_texts(card, &layout.badges)
        .into_iter()
        .filter(|t| markup.quantities.sold(t).is_none() && !t.starts_with('+'))
        .collect();

    let draft = ListingDraft {
        url: link.as_ref().map(|url| canonical_listing_url(url).to_string()),
        item_number,
        title,
        sub_title: first_text(card, &layout.subtitle),
        why_to_buy,
        price: price.map(|p| p.amount),
        was_price: was_price.map(|p| p.amount),
        available,
        available_text,
        sold,
        image: image_of(card, layout, page_url),
        seller: first_text(card, &layout.seller),
        item_location: first_text(card, &layout.location),
        ..Default::default()
    };

    Some(draft.finish(&domain.currency))
}

/// Primary image URL, preferring lazy-load sources over GIF placeholders
fn image_of(card: ElementRef<'_>, layout: &CardLayout, page_url: &Url) -> Option<String> {
    let src = first_attr(card, &layout.image, "src");
    let src = match src {
        Some(s) if !s.ends_with(".gif") && !s.starts_with("data:") => Some(s),
        _ => first_attr(card, &layout.image, "data-src").or(src),
    };
    src.and_then(|s| resolve_href(&s, page_url))
        .map(|url| url.to_string())
}

/// Finds the link to the page after the current one
///
/// The numbered pagination item for `current + 1` wins; the "next" arrow is
/// the fallback. A link back to the current page, or a current page at the
/// top of the page-number range, means there is no next page.
fn next_page_link(markup: &EbayMarkup, root: ElementRef<'_>, page_url: &Url) -> Option<Url> {
    let wanted = page_number(page_url).checked_add(1)?.to_string();

    let numbered = markup
        .pagination_items
        .iter()
        .flat_map(|selector| root.select(selector))
        .find(|a| text_of(*a) == wanted)
        .and_then(|a| a.value().attr("href"));

    let arrow = || {
        markup
            .pagination_next
            .iter()
            .flat_map(|selector| root.select(selector))
            .find(|a| a.value().attr("aria-disabled") != Some("true"))
            .and_then(|a| a.value().attr("href"))
    };

    let next = resolve_href(numbered.or_else(arrow)?, page_url)?;
    let next = normalize_search_url(&next);

    if next == normalize_search_url(page_url) {
        None
    } else {
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainRegistry, Region};
    use crate::parser::parse;

    fn page(url: &str, body: &str) -> RawPage {
        RawPage {
            url: Url::parse(url).unwrap(),
            status: 200,
            body: body.to_string(),
        }
    }

    const CARD_PAGE: &str = r#"
        <html><body>
        <ul class="srp-results">
          <li class="s-item">
            <a class="s-item__link" href="https://ebay.com/itm/123456"><div class="s-item__title">Shop on eBay</div></a>
          </li>
          <li class="s-item" data-listingid="256123456789">
            <div class="s-item__image"><img class="s-item__image-img" src="https://ir.ebaystatic.com/pictures/aw/pics/s_1x2.gif" data-src="https://i.ebayimg.com/images/g/a/s-l225.jpg" alt="Desk Lamp"></div>
            <a class="s-item__link" href="https://www.ebay.com/itm/256123456789?hash=item3ba&amp;_trkparms=x">
              <div class="s-item__title"><span class="LIGHT_HIGHLIGHT">New Listing</span>Desk Lamp Brass</div>
            </a>
            <div class="s-item__subtitle">Brand New</div>
            <span class="s-item__price">$39.00</span>
            <span class="s-item__dynamic"><span class="STRIKETHROUGH">$41.05</span></span>
            <span class="s-item__availability">More than 10 available</span>
            <span class="s-item__hotness">25 sold</span>
            <span class="s-item__seller-info-text">lampshop (1,234) 99.5%</span>
            <span class="s-item__location s-item__itemLocation">from United States</span>
            <span class="s-item__free-returns">Free returns</span>
            <span class="s-item__shipping">+$5.00 shipping</span>
          </li>
          <li class="s-item">
            <a class="s-item__link" href="https://www.ebay.com/itm/Floor-Lamp/334455667788"><div class="s-item__title">Floor Lamp</div></a>
            <span class="s-item__price">$10.00 to $20.00</span>
            <span class="s-item__hotness">Almost gone</span>
          </li>
          <li class="s-item">
            <a class="s-item__link" href="https://www.ebay.com/p/lamp-guide"><div class="s-item__title">No id</div></a>
            <span class="s-item__price">$5.00</span>
          </li>
        </ul>
        <nav class="pagination">
          <a class="pagination__item" href="/sch/i.html?_nkw=lamp&amp;_pgn=1">1</a>
          <a class="pagination__item" href="/sch/i.html?_nkw=lamp&amp;_pgn=2">2</a>
          <a class="pagination__next" href="/sch/i.html?_nkw=lamp&amp;_pgn=2">Next</a>
        </nav>
        </body></html>
    "#;

    #[test]
    fn test_parse_classic_cards() {
        let us = DomainRegistry::standard().get(Region::US).unwrap();
        let parsed = parse(&page("https://www.ebay.com/sch/i.html?_ipg=60&_nkw=lamp&_pgn=1", CARD_PAGE), &us);

        assert_eq!(parsed.records.len(), 2);
        let lamp = &parsed.records[0];
        assert_eq!(lamp.item_number(), "256123456789");
        assert_eq!(lamp.url(), "https://www.ebay.com/itm/256123456789");
        assert_eq!(lamp.title(), "Desk Lamp Brass");
        assert_eq!(lamp.sub_title(), Some("Brand New"));
        assert_eq!(lamp.price(), Some(39.0));
        assert_eq!(lamp.was_price(), Some(41.05));
        assert_eq!(lamp.price_with_currency(), Some("USD 39.00"));
        assert_eq!(lamp.was_price_with_currency(), Some("USD 41.05"));
        assert_eq!(lamp.available(), Some(10));
        assert_eq!(lamp.available_text(), Some("More than 10 available"));
        assert_eq!(lamp.sold(), Some(25));
        assert_eq!(lamp.image(), Some("https://i.ebayimg.com/images/g/a/s-l225.jpg"));
        assert_eq!(lamp.seller(), Some("lampshop (1,234) 99.5%"));
        assert_eq!(lamp.why_to_buy(), ["Free returns"]);

        let floor = &parsed.records[1];
        assert_eq!(floor.item_number(), "334455667788");
        assert_eq!(floor.price(), Some(10.0));
        assert_eq!(floor.sold(), None);
        assert_eq!(floor.why_to_buy(), ["Almost gone"]);
    }

    #[test]
    fn test_card_without_item_number_is_an_anomaly() {
        let us = DomainRegistry::standard().get(Region::US).unwrap();
        let parsed = parse(&page("https://www.ebay.com/sch/i.html?_nkw=lamp&_pgn=1", CARD_PAGE), &us);

        assert_eq!(parsed.anomalies.len(), 1);
        assert!(matches!(
            &parsed.anomalies[0],
            ParseAnomaly::MissingItemNumber { url } if url == "https://www.ebay.com/p/lamp-guide"
        ));
    }

    #[test]
    fn test_next_page_by_index() {
        let us = DomainRegistry::standard().get(Region::US).unwrap();
        let parsed = parse(&page("https://www.ebay.com/sch/i.html?_ipg=60&_nkw=lamp&_pgn=1", CARD_PAGE), &us);

        let next = parsed.next_page.unwrap();
        assert_eq!(
            next.as_str(),
            "https://www.ebay.com/sch/i.html?_ipg=60&_nkw=lamp&_pgn=2"
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let us = DomainRegistry::standard().get(Region::US).unwrap();
        let body = r#"
            <ul class="srp-results"></ul>
            <a class="pagination__item" href="/sch/i.html?_nkw=lamp&amp;_pgn=1">1</a>
            <a class="pagination__item" href="/sch/i.html?_nkw=lamp&amp;_pgn=2">2</a>
            <a class="pagination__next" aria-disabled="true" href="/sch/i.html?_nkw=lamp&amp;_pgn=2">Next</a>
        "#;
        let parsed = parse(&page("https://www.ebay.com/sch/i.html?_nkw=lamp&_pgn=2", body), &us);

        assert!(parsed.records.is_empty());
        assert!(parsed.next_page.is_none());
    }

    #[test]
    fn test_highest_page_number_has_no_next() {
        let us = DomainRegistry::standard().get(Region::US).unwrap();
        let parsed = parse(
            &page("https://www.ebay.com/sch/i.html?_nkw=lamp&_pgn=4294967295", CARD_PAGE),
            &us,
        );

        assert_eq!(parsed.records.len(), 2);
        assert!(parsed.next_page.is_none());
    }

    #[test]
    fn test_grid_layout_and_german_prices() {
        let de = DomainRegistry::standard().get(Region::DE).unwrap();
        let body = r#"
            <ul class="srp-results">
              <li class="s-card" data-listingid="155566677788">
                <a class="su-link" href="https://www.ebay.de/itm/155566677788?_trksid=p1"><div class="s-card__title">Neues AngebotSchreibtischlampe</div></a>
                <div class="s-card__price">EUR 1.299,00</div>
                <div class="s-card__price--strikethrough">EUR 1.499,50</div>
                <div class="s-card__sold">1.234 verkauft</div>
              </li>
            </ul>
        "#;
        let parsed = parse(&page("https://www.ebay.de/sch/i.html?_nkw=lampe&_pgn=1", body), &de);

        assert_eq!(parsed.records.len(), 1);
        let record = &parsed.records[0];
        assert_eq!(record.title(), "Schreibtischlampe");
        assert_eq!(record.price(), Some(1299.0));
        assert_eq!(record.was_price(), Some(1499.5));
        assert_eq!(record.price_with_currency(), Some("EUR 1299.00"));
        assert_eq!(record.sold(), Some(1234));
    }
}
