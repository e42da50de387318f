//! Locale-specific markup vocabulary
//!
//! Regional storefronts render the same layout with translated labels and
//! different number formats. Everything the parser needs to know about a
//! language lives here.

/// Labels and number conventions of one storefront language
#[derive(Debug)]
pub struct Locale {
    /// Language tag, for logging
    pub tag: &'static str,

    /// Prices use `,` as decimal separator and `.` for thousands
    pub decimal_comma: bool,

    /// Badge text prepended to fresh listing titles
    pub new_listing_labels: &'static [&'static str],

    /// Words following a quantity in availability text ("10 available")
    pub available_words: &'static [&'static str],

    /// Phrases meaning exactly one unit is left
    pub last_one_phrases: &'static [&'static str],

    /// Words following a quantity in sold text ("25 sold")
    pub sold_words: &'static [&'static str],

    /// Item-specifics labels for the brand
    pub brand_labels: &'static [&'static str],

    /// Item-specifics labels for the product type
    pub type_labels: &'static [&'static str],

    /// Labels introducing the item location on listing pages
    pub location_labels: &'static [&'static str],
}

pub static ENGLISH: Locale = Locale {
    tag: "en",
    decimal_comma: false,
    new_listing_labels: &["New Listing"],
    available_words: &["available"],
    last_one_phrases: &["last one", "only one left", "last item"],
    sold_words: &["sold"],
    brand_labels: &["Brand"],
    type_labels: &["Type", "Product Type"],
    location_labels: &["Item location", "Located in"],
};

pub static GERMAN: Locale = Locale {
    tag: "de",
    decimal_comma: true,
    new_listing_labels: &["Neues Angebot"],
    available_words: &["verfügbar"],
    last_one_phrases: &["letzter artikel", "nur noch 1"],
    sold_words: &["verkauft"],
    brand_labels: &["Marke", "Brand"],
    type_labels: &["Produktart", "Typ", "Type"],
    location_labels: &["Artikelstandort", "Standort"],
};

pub static FRENCH: Locale = Locale {
    tag: "fr",
    decimal_comma: true,
    new_listing_labels: &["Nouvelle annonce"],
    available_words: &["disponibles", "disponible"],
    last_one_phrases: &["dernier article", "plus qu'un"],
    sold_words: &["vendus", "vendu"],
    brand_labels: &["Marque", "Brand"],
    type_labels: &["Type"],
    location_labels: &["Lieu où se trouve l'objet", "Situé"],
};

pub static ITALIAN: Locale = Locale {
    tag: "it",
    decimal_comma: true,
    new_listing_labels: &["Nuova inserzione"],
    available_words: &["disponibili", "disponibile"],
    last_one_phrases: &["ultimo disponibile", "ultimo articolo"],
    sold_words: &["venduti", "venduto"],
    brand_labels: &["Marca", "Brand"],
    type_labels: &["Tipo", "Type"],
    location_labels: &["Posizione dell'oggetto", "Si trova in"],
};

pub static SPANISH: Locale = Locale {
    tag: "es",
    decimal_comma: true,
    new_listing_labels: &["Nuevo anuncio"],
    available_words: &["disponibles", "disponible"],
    last_one_phrases: &["último artículo", "último disponible"],
    sold_words: &["vendidos", "vendido"],
    brand_labels: &["Marca", "Brand"],
    type_labels: &["Tipo", "Type"],
    location_labels: &["Ubicación del artículo", "Ubicado en"],
};

pub static DUTCH: Locale = Locale {
    tag: "nl",
    decimal_comma: true,
    new_listing_labels: &["Nieuwe aanbieding"],
    available_words: &["beschikbaar"],
    last_one_phrases: &["laatste", "nog maar 1"],
    sold_words: &["verkocht"],
    brand_labels: &["Merk", "Brand"],
    type_labels: &["Type"],
    location_labels: &["Locatie van het object", "Locatie"],
};
