//! Field locators for the marketplace's page layouts
//!
//! Result pages come in two generations of markup: the classic `s-item`
//! cards and the newer `s-card` grid. Each is described by a [`CardLayout`];
//! the strategy tries them in order and uses the first that matches any card.

use super::dom::compile;
use super::normalize::QuantityPatterns;
use super::{item, search, PageParser, ParsedPage};
use crate::crawler::RawPage;
use crate::domain::{Domain, Locale};
use crate::listing::ListingDraft;
use scraper::Selector;

/// Locators for listing cards on a search or category page
#[derive(Debug)]
pub(crate) struct CardLayout {
    pub name: &'static str,
    pub cards: Vec<Selector>,
    pub title: Vec<Selector>,
    pub link: Vec<Selector>,
    pub image: Vec<Selector>,
    pub price: Vec<Selector>,
    pub was_price: Vec<Selector>,
    pub availability: Vec<Selector>,
    pub sold: Vec<Selector>,
    pub subtitle: Vec<Selector>,
    pub seller: Vec<Selector>,
    pub location: Vec<Selector>,
    pub badges: Vec<Selector>,
}

impl CardLayout {
    fn classic() -> Self {
        Self {
            name: "s-item",
            cards: compile(&["ul.srp-results li.s-item", "li.s-item"]),
            title: compile(&[".s-item__title"]),
            link: compile(&["a.s-item__link"]),
            image: compile(&["img.s-item__image-img", ".s-item__image img"]),
            price: compile(&[".s-item__price"]),
            was_price: compile(&[
                ".s-item__dynamic .STRIKETHROUGH",
                ".s-item__wasPrice",
                ".STRIKETHROUGH",
            ]),
            availability: compile(&[".s-item__availability", ".s-item__quantity"]),
            sold: compile(&[".s-item__hotness", ".s-item__quantitySold"]),
            subtitle: compile(&[".s-item__subtitle"]),
            seller: compile(&[".s-item__seller-info-text", ".s-item__seller-info"]),
            location: compile(&[".s-item__location.s-item__itemLocation", ".s-item__location"]),
            badges: compile(&[
                ".s-item__free-returns",
                ".s-item__freeXDays",
                ".s-item__shipping",
                ".s-item__etrs-text",
                ".s-item__hotness",
            ]),
        }
    }

    fn grid() -> Self {
        Self {
            name: "s-card",
            cards: compile(&["ul.srp-results li.s-card", "li.s-card"]),
            title: compile(&[".s-card__title"]),
            link: compile(&["a.su-link", "a.s-card__link", "a[href*='/itm/']"]),
            image: compile(&["img.s-card__image", ".su-media img"]),
            price: compile(&[".s-card__price"]),
            was_price: compile(&[".s-card__price--strikethrough", ".STRIKETHROUGH"]),
            availability: compile(&[".s-card__availability"]),
            sold: compile(&[".s-card__sold", ".s-card__hotness"]),
            subtitle: compile(&[".s-card__subtitle"]),
            seller: compile(&[".s-card__seller"]),
            location: compile(&[".s-card__location"]),
            badges: compile(&[".s-card__free-returns", ".s-card__shipping", ".s-card__hotness"]),
        }
    }
}

/// Locators for a single listing page
#[derive(Debug)]
pub(crate) struct ItemLayout {
    pub title: Vec<Selector>,
    pub subtitle: Vec<Selector>,
    pub price: Vec<Selector>,
    pub was_price: Vec<Selector>,
    pub availability: Vec<Selector>,
    pub image: Vec<Selector>,
    pub breadcrumbs: Vec<Selector>,
    pub seller: Vec<Selector>,
    pub item_number: Vec<Selector>,
    pub brand_meta: Vec<Selector>,
    pub spec_rows: Vec<Selector>,
    pub spec_label: Vec<Selector>,
    pub spec_value: Vec<Selector>,
    pub secondary_text: Vec<Selector>,
}

impl ItemLayout {
    fn standard() -> Self {
        Self {
            title: compile(&["h1.x-item-title__mainTitle", "h1#itemTitle", "h1"]),
            subtitle: compile(&[".x-item-title__subTitle", "#subTitle"]),
            price: compile(&[".x-price-primary", "#prcIsum", "[itemprop='price']"]),
            was_price: compile(&[
                ".x-additional-info .ux-textspans--STRIKETHROUGH",
                ".x-price-transparency .ux-textspans--STRIKETHROUGH",
                "#orgPrc",
            ]),
            availability: compile(&["#qtySubTxt", ".x-quantity__availability"]),
            image: compile(&[".ux-image-carousel-item img", "#icImg"]),
            breadcrumbs: compile(&[
                "nav.breadcrumbs a",
                "#vi-VR-brumb-lnkLst a",
                ".seo-breadcrumb-text",
            ]),
            seller: compile(&[
                ".x-sellercard-atf__info__about-seller a span",
                ".ux-seller-section__item--seller a span",
                ".mbg-nw",
            ]),
            item_number: compile(&[
                ".ux-layout-section__textual-display--itemId .ux-textspans--BOLD",
                "#descItemNumber",
            ]),
            brand_meta: compile(&[
                "meta[property='og:brand']",
                "meta[property='product:brand']",
                "meta[itemprop='brand']",
            ]),
            spec_rows: compile(&[".ux-labels-values", ".itemAttr tr"]),
            spec_label: compile(&[".ux-labels-values__labels", "td.attrLabels"]),
            spec_value: compile(&[".ux-labels-values__values", "td.attrLabels + td"]),
            secondary_text: compile(&[".ux-textspans--SECONDARY", ".ux-textspans"]),
        }
    }
}

/// Parser strategy for the marketplace's storefronts in one locale
#[derive(Debug)]
pub struct EbayMarkup {
    pub(crate) locale: &'static Locale,
    pub(crate) layouts: Vec<CardLayout>,
    pub(crate) item: ItemLayout,
    pub(crate) pagination_items: Vec<Selector>,
    pub(crate) pagination_next: Vec<Selector>,
    pub(crate) quantities: QuantityPatterns,
}

impl EbayMarkup {
    /// Builds the strategy for a locale, compiling all locators once
    pub fn new(locale: &'static Locale) -> Self {
        Self {
            locale,
            layouts: vec![CardLayout::classic(), CardLayout::grid()],
            item: ItemLayout::standard(),
            pagination_items: compile(&["a.pagination__item", ".pagination__items a"]),
            pagination_next: compile(&["a.pagination__next"]),
            quantities: QuantityPatterns::new(locale),
        }
    }
}

impl PageParser for EbayMarkup {
    fn parse_search(&self, page: &RawPage, domain: &Domain) -> ParsedPage {
        search::parse_search_page(self, page, domain)
    }

    fn parse_item(&self, page: &RawPage, domain: &Domain) -> ListingDraft {
        item::parse_item_page(self, page, domain)
    }
}
