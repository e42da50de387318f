use super::dom::{all_texts, first_attr, first_text, text_of};
use super::markup::{EbayMarkup, ItemLayout};
use super::normalize::{parse_price, strip_leading_labels};
use crate::crawler::RawPage;
use crate::domain::Domain;
use crate::listing::ListingDraft;
use crate::url::{canonical_listing_url, extract_item_number, is_item_number};
use scraper::{ElementRef, Html};

const UPC_LABELS: &[&str] = &["UPC"];
const EAN_LABELS: &[&str] = &["EAN", "GTIN"];
const MPN_LABELS: &[&str] = &[
    "MPN",
    "Herstellernummer",
    "Numéro de pièce fabricant",
    "Codice produttore",
    "Número de pieza fabricante",
    "Fabrikantnummer",
];

/// Placeholder values sellers put in identifier fields
const NOT_APPLICABLE: &[&str] = &[
    "Does not apply",
    "N/A",
    "Nicht zutreffend",
    "Ne s'applique pas",
    "Non applicabile",
    "No aplicable",
    "Niet van toepassing",
];

/// Breadcrumb entries that are navigation, not categories
const BREADCRUMB_ROOTS: &[&str] = &["eBay", "Home"];

pub(crate) fn parse_item_page(markup: &EbayMarkup, page: &RawPage, domain: &Domain) -> ListingDraft {
    let document = Html::parse_document(&page.body);
    let root = document.root_element();
    let layout = &markup.item;
    let locale = markup.locale;
    let specifics = item_specifics(root, layout);

    let item_number = extract_item_number(&page.url).or_else(|| {
        first_text(root, &layout.item_number).filter(|id| is_item_number(id))
    });

    let price = first_text(root, &layout.price).and_then(|t| parse_price(&t, locale));
    let was_price = first_text(root, &layout.was_price).and_then(|t| parse_price(&t, locale));

    let quantity_texts = all_texts(root, &layout.availability);
    let available_text = quantity_texts
        .iter()
        .find(|t| markup.quantities.sold(t).is_none())
        .cloned();

    let brand = first_attr(root, &layout.brand_meta, "content")
        .or_else(|| lookup(&specifics, locale.brand_labels));

    let item_location = lookup(&specifics, locale.location_labels)
        .or_else(|| labelled_text(root, layout, locale.location_labels));

    tracing::debug!(
        "Listing page {} ({}) has {} item specifics",
        page.url,
        domain.region,
        specifics.len()
    );

    ListingDraft {
        url: Some(canonical_listing_url(&page.url).to_string()),
        item_number,
        categories: breadcrumbs(root, layout),
        title: first_text(root, &layout.title)
            .map(|t| strip_leading_labels(&t, locale.new_listing_labels)),
        sub_title: first_text(root, &layout.subtitle),
        price: price.map(|p| p.amount),
        was_price: was_price.map(|p| p.amount),
        available: available_text
            .as_deref()
            .and_then(|t| markup.quantities.available(t)),
        available_text,
        sold: quantity_texts
            .iter()
            .find_map(|t| markup.quantities.sold(t)),
        image: first_attr(root, &layout.image, "data-zoom-src")
            .or_else(|| first_attr(root, &layout.image, "src")),
        seller: first_text(root, &layout.seller),
        item_location,
        brand,
        ean: lookup(&specifics, EAN_LABELS),
        upc: lookup(&specifics, UPC_LABELS),
        mpn: lookup(&specifics, MPN_LABELS),
        listing_type: lookup(&specifics, locale.type_labels),
        ..Default::default()
    }
}

/// Label/value pairs from the item specifics table
fn item_specifics(root: ElementRef<'_>, layout: &ItemLayout) -> Vec<(String, String)> {
    layout
        .spec_rows
        .iter()
        .flat_map(|selector| root.select(selector))
        .filter_map(|row| {
            let label = first_text(row, &layout.spec_label)?;
            let value = first_text(row, &layout.spec_value)?;
            Some((label.trim_end_matches(':').trim().to_string(), value))
        })
        .collect()
}

/// First specifics value under any of `labels`, ignoring placeholders
fn lookup(specifics: &[(String, String)], labels: &[&str]) -> Option<String> {
    specifics
        .iter()
        .find(|(label, _)| labels.iter().any(|l| label.eq_ignore_ascii_case(l)))
        .map(|(_, value)| value.clone())
        .filter(|value| !NOT_APPLICABLE.iter().any(|na| value.eq_ignore_ascii_case(na)))
}

/// Text following "Label:" in free-standing spans such as "Located in: Berlin"
fn labelled_text(root: ElementRef<'_>, layout: &ItemLayout, labels: &[&str]) -> Option<String> {
    all_texts(root, &layout.secondary_text).into_iter().find_map(|text| {
        let (label, value) = text.split_once(':')?;
        let label = label.trim();
        let value = value.trim();
        (labels.iter().any(|l| label.eq_ignore_ascii_case(l)) && !value.is_empty())
            .then(|| value.to_string())
    })
}

/// Category path from the first breadcrumb trail found, root first
fn breadcrumbs(root: ElementRef<'_>, layout: &ItemLayout) -> Vec<String> {
    layout
        .breadcrumbs
        .iter()
        .map(|selector| {
            root.select(selector)
                .map(text_of)
                .filter(|t| !t.is_empty())
                .filter(|t| !BREADCRUMB_ROOTS.iter().any(|r| t.eq_ignore_ascii_case(r)))
                .collect::<Vec<_>>()
        })
        .find(|trail| !trail.is_empty())
        .unwrap_or_default()
}
