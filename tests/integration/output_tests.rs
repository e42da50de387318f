//! Integration tests for the record writers
//!
//! Every format is written to a temporary directory and read back.

use chrono::Local;
use listing_sift::config::{OutputConfig, OutputFormat};
use listing_sift::domain::Currency;
use listing_sift::output::{
    open_sinks, output_path, read_csv, read_json, read_spreadsheet, read_xml, CsvSink, JsonSink,
    RecordSink, SpreadsheetSink, XmlSink,
};
use listing_sift::{ListingDraft, ListingRecord};
use std::path::Path;
use tempfile::TempDir;

const EUR: Currency = Currency {
    code: "EUR",
    symbol: "€",
};

fn full_record() -> ListingRecord {
    ListingDraft {
        url: Some("https://www.ebay.de/itm/Schreibtischlampe/256123456789".to_string()),
        item_number: Some("256123456789".to_string()),
        categories: vec!["Möbel & Wohnen".to_string(), "Lampen & Licht".to_string()],
        title: Some("Schreibtischlampe \"Bauhaus\" <Messing>".to_string()),
        sub_title: Some("Neu, original verpackt".to_string()),
        why_to_buy: vec!["Kostenloser Versand".to_string(), "Rücknahme".to_string()],
        price: Some(29.9),
        was_price: Some(34.5),
        available: Some(3),
        available_text: Some("3 verfügbar".to_string()),
        sold: Some(17),
        image: Some("https://i.ebayimg.com/images/g/b/s-l500.jpg".to_string()),
        seller: Some("leuchtwerk".to_string()),
        item_location: Some("Berlin, Deutschland".to_string()),
        brand: Some("Leuchtwerk".to_string()),
        ean: Some("4006381333931".to_string()),
        upc: None,
        mpn: Some("LW-204".to_string()),
        listing_type: Some("Schreibtischlampe".to_string()),
    }
    .finish(&EUR)
    .unwrap()
}

fn sparse_record() -> ListingRecord {
    ListingDraft {
        url: Some("https://www.ebay.de/itm/334455667788".to_string()),
        item_number: Some("334455667788".to_string()),
        title: Some("Stehlampe".to_string()),
        ..Default::default()
    }
    .finish(&EUR)
    .unwrap()
}

fn write_all(mut sink: impl RecordSink, records: &[ListingRecord]) {
    for record in records {
        sink.write(record).unwrap();
    }
    sink.finish().unwrap();
}

fn records() -> Vec<ListingRecord> {
    vec![full_record(), sparse_record()]
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listings.json");

    write_all(JsonSink::create(&path).unwrap(), &records());

    assert_eq!(read_json(&path).unwrap(), records());
}

#[test]
fn test_csv_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listings.csv");

    write_all(CsvSink::create(&path).unwrap(), &records());

    assert_eq!(read_csv(&path).unwrap(), records());
}

#[test]
fn test_xml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listings.xml");

    write_all(XmlSink::create(&path).unwrap(), &records());

    assert_eq!(read_xml(&path).unwrap(), records());
}

#[test]
fn test_spreadsheet_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listings.spreadsheet.xml");

    write_all(SpreadsheetSink::create(&path).unwrap(), &records());

    assert_eq!(read_spreadsheet(&path).unwrap(), records());
}

#[test]
fn test_empty_outputs_are_valid_documents() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("empty.json");
    let csv = dir.path().join("empty.csv");
    let xml = dir.path().join("empty.xml");
    let sheet = dir.path().join("empty.spreadsheet.xml");

    write_all(JsonSink::create(&json).unwrap(), &[]);
    write_all(CsvSink::create(&csv).unwrap(), &[]);
    write_all(XmlSink::create(&xml).unwrap(), &[]);
    write_all(SpreadsheetSink::create(&sheet).unwrap(), &[]);

    assert!(read_json(&json).unwrap().is_empty());
    assert!(read_csv(&csv).unwrap().is_empty());
    assert!(read_xml(&xml).unwrap().is_empty());
    assert!(read_spreadsheet(&sheet).unwrap().is_empty());

    // The CSV still carries its header row
    let header = std::fs::read_to_string(&csv).unwrap();
    assert!(header.starts_with("url,itemNumber,categories,title"));
}

#[test]
fn test_dispatcher_writes_every_format() {
    let dir = TempDir::new().unwrap();
    let config = OutputConfig {
        directory: dir.path().join("nested").display().to_string(),
        timestamped: false,
        formats: vec![
            OutputFormat::Json,
            OutputFormat::Csv,
            OutputFormat::Xml,
            OutputFormat::Spreadsheet,
        ],
        ..Default::default()
    };
    let started_at = Local::now();

    let mut dispatcher = open_sinks(&config, started_at).unwrap();
    assert_eq!(dispatcher.active_writers(), 4);
    for record in records() {
        dispatcher.emit(&record);
    }
    let report = dispatcher.finish();

    assert!(!report.has_failures());
    assert!(report.writers.iter().all(|w| w.records_written == 2));

    let path = |format| output_path(&config, format, started_at);
    assert_eq!(read_json(&path(OutputFormat::Json)).unwrap(), records());
    assert_eq!(read_csv(&path(OutputFormat::Csv)).unwrap(), records());
    assert_eq!(read_xml(&path(OutputFormat::Xml)).unwrap(), records());
    assert_eq!(read_spreadsheet(&path(OutputFormat::Spreadsheet)).unwrap(), records());
}

#[test]
fn test_unwritable_directory_yields_no_writers() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let config = OutputConfig {
        directory: blocker.join("out").display().to_string(),
        timestamped: false,
        formats: vec![OutputFormat::Json],
        ..Default::default()
    };

    assert!(open_sinks(&config, Local::now()).is_err());
    assert!(!Path::new(&config.directory).exists());
}
