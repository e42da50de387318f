//! Integration tests for the extraction pipeline
//!
//! These tests use wiremock to serve result and listing pages and run the
//! full pipeline end-to-end into temporary output directories.

use listing_sift::config::{Config, OutputFormat};
use listing_sift::crawler::run_pipeline;
use listing_sift::output::{read_json, ExitStatus, RunSummary};
use listing_sift::ListingRecord;
use listing_sift::TerminationCause;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Renders a result page with one card per item number
///
/// `next` adds a pagination link to that page number.
fn result_page(ids: &[u64], next: Option<u32>) -> String {
    let mut body = String::from("<html><body><ul class=\"srp-results\">");
    for id in ids {
        body.push_str(&format!(
            r#"<li class="s-item">
                 <a class="s-item__link" href="/itm/Lamp-{id}/{id}"><div class="s-item__title">Lamp {id}</div></a>
                 <span class="s-item__price">$19.99</span>
               </li>"#,
            id = id
        ));
    }
    body.push_str("</ul>");
    if let Some(n) = next {
        body.push_str(&format!(
            r#"<nav class="pagination"><a class="pagination__item" href="/sch/i.html?_nkw=lamp&amp;_pgn={n}">{n}</a></nav>"#,
            n = n
        ));
    }
    body.push_str("</body></html>");
    body
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<u64> {
    range.map(|n| 100_000_000 + n).collect()
}

/// Creates a test configuration writing JSON into `dir`
fn create_test_config(dir: &Path, urls: Vec<String>) -> Config {
    let mut config = Config::default();
    config.input.urls = urls;
    config.scraper.page_delay_ms = 0;
    config.scraper.concurrency = 2;
    config.scraper.timeout_secs = 5;
    config.retry.base_delay_ms = 10;
    config.retry.max_delay_ms = 50;
    config.output.directory = dir.display().to_string();
    config.output.timestamped = false;
    config.output.formats = vec![OutputFormat::Json];
    config
}

async fn run(config: &Config) -> RunSummary {
    let (_tx, rx) = watch::channel(false);
    run_pipeline(config, "test-hash", rx)
        .await
        .expect("pipeline should run")
}

fn emitted(dir: &TempDir) -> Vec<ListingRecord> {
    read_json(&dir.path().join("listings.json")).expect("JSON output should parse")
}

fn item_numbers(records: &[ListingRecord]) -> Vec<String> {
    records.iter().map(|r| r.item_number().to_string()).collect()
}

#[tokio::test]
async fn test_max_items_truncates_second_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .and(query_param("_pgn", "1"))
        .respond_with(html(result_page(&ids(1..=8), Some(2))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .and(query_param("_pgn", "2"))
        .respond_with(html(result_page(&ids(9..=14), None)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);
    config.scraper.max_items = 10;

    let summary = run(&config).await;

    assert_eq!(summary.records_emitted, 10);
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.termination, TerminationCause::MaxItemsReached);
    assert_eq!(summary.exit_status(), ExitStatus::Success);

    let records = emitted(&dir);
    let expected: Vec<String> = ids(1..=10).iter().map(|id| id.to_string()).collect();
    assert_eq!(item_numbers(&records), expected);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(html(result_page(&ids(1..=3), None)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);
    config.retry.max_attempts = 3;

    let summary = run(&config).await;

    assert_eq!(summary.transient_failures, 2);
    assert_eq!(summary.fatal_failures, 0);
    assert_eq!(summary.records_emitted, 3);
    assert_eq!(summary.termination, TerminationCause::FrontierExhausted);
    assert_eq!(summary.exit_status(), ExitStatus::Success);
}

#[tokio::test]
async fn test_exhausted_retries_abandon_the_input() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);
    config.retry.max_attempts = 2;

    let summary = run(&config).await;

    assert_eq!(summary.transient_failures, 2);
    assert_eq!(summary.fatal_failures, 1);
    assert_eq!(summary.incomplete_inputs, 1);
    assert_eq!(summary.exit_status(), ExitStatus::Failure);
    assert!(emitted(&dir).is_empty());
}

#[tokio::test]
async fn test_card_without_item_number_is_skipped() {
    let server = MockServer::start().await;

    let body = r#"<html><body><ul class="srp-results">
        <li class="s-item">
          <a class="s-item__link" href="/itm/Lamp/100000001"><div class="s-item__title">Lamp one</div></a>
          <span class="s-item__price">$10.00</span>
        </li>
        <li class="s-item">
          <a class="s-item__link" href="/p/buying-guide"><div class="s-item__title">Guide</div></a>
          <span class="s-item__price">$1.00</span>
        </li>
        <li class="s-item">
          <a class="s-item__link" href="/itm/Lamp/100000002"><div class="s-item__title">Lamp two</div></a>
          <span class="s-item__price">$12.00</span>
        </li>
        </ul></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(html(body.to_string()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);

    let summary = run(&config).await;

    assert_eq!(summary.parse_anomalies, 1);
    assert_eq!(summary.records_emitted, 2);
    assert_eq!(item_numbers(&emitted(&dir)), ["100000001", "100000002"]);
}

#[tokio::test]
async fn test_duplicates_across_inputs_are_suppressed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .and(query_param("_nkw", "a"))
        .respond_with(html(result_page(&ids(1..=3), None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .and(query_param("_nkw", "b"))
        .respond_with(html(result_page(&ids(3..=5), None)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![
            format!("{}/sch/i.html?_nkw=a", server.uri()),
            format!("{}/sch/i.html?_nkw=b", server.uri()),
        ],
    );

    let summary = run(&config).await;

    assert_eq!(summary.records_emitted, 5);
    assert_eq!(summary.duplicates_suppressed, 1);

    // Completion order across inputs is not fixed; compare as sets
    let mut got = item_numbers(&emitted(&dir));
    got.sort();
    let expected: Vec<String> = ids(1..=5).iter().map(|id| id.to_string()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_missing_page_is_fatal_for_its_input_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(html(result_page(&ids(1..=2), None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/Gone/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![
            format!("{}/sch/i.html?_nkw=lamp", server.uri()),
            format!("{}/b/Gone/404", server.uri()),
        ],
    );

    let summary = run(&config).await;

    assert_eq!(summary.fatal_failures, 1);
    assert_eq!(summary.transient_failures, 0);
    assert_eq!(summary.incomplete_inputs, 1);
    assert_eq!(summary.records_emitted, 2);
    assert_eq!(summary.exit_status(), ExitStatus::Partial);
}

#[tokio::test]
async fn test_item_pages_enrich_card_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(html(result_page(&[100_000_001, 100_000_002], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/itm/Lamp-100000001/100000001"))
        .respond_with(html(
            r#"<html><head><meta property="og:brand" content="Acme"></head><body>
               <nav class="breadcrumbs"><a href="/">eBay</a><a href="/b/Home/1">Home &amp; Garden</a><a href="/b/Lamps/2">Lamps</a></nav>
               <h1 class="x-item-title__mainTitle">Lamp 100000001</h1>
               </body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/itm/Lamp-100000002/100000002"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);
    config.scraper.follow_item_page = true;

    let summary = run(&config).await;

    assert_eq!(summary.records_emitted, 2);
    assert_eq!(summary.item_page_failures, 1);
    assert_eq!(summary.fatal_failures, 0);

    let records = emitted(&dir);
    assert_eq!(records[0].brand(), Some("Acme"));
    assert_eq!(records[0].categories(), ["Home & Garden", "Lamps"]);
    assert_eq!(records[1].brand(), None);
    assert_eq!(records[1].price(), Some(19.99));
}

#[tokio::test]
async fn test_listing_urls_yield_single_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/itm/Brass-Lamp/256123456789"))
        .respond_with(html(
            r#"<html><body>
               <h1 class="x-item-title__mainTitle">Brass Lamp</h1>
               <div class="x-price-primary"><span>US $39.00</span></div>
               <div class="x-additional-info"><span class="ux-textspans--STRIKETHROUGH">US $41.05</span></div>
               </body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), Vec::new());
    config.input.listing_urls = vec![format!("{}/itm/Brass-Lamp/256123456789", server.uri())];

    let summary = run(&config).await;
    assert_eq!(summary.records_emitted, 1);

    let records = emitted(&dir);
    assert_eq!(records[0].item_number(), "256123456789");
    assert_eq!(records[0].title(), "Brass Lamp");
    assert_eq!(records[0].price(), Some(39.0));
    assert_eq!(records[0].was_price(), Some(41.05));
    assert_eq!(records[0].price_with_currency(), Some("USD 39.00"));
    assert_eq!(records[0].was_price_with_currency(), Some("USD 41.05"));
}

#[tokio::test]
async fn test_cancelled_run_closes_writers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(html(result_page(&ids(1..=2), None)).set_delay(std::time::Duration::from_secs(2)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);

    let (tx, rx) = watch::channel(false);
    let cancel = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        tx.send(true).unwrap();
    });

    let summary = run_pipeline(&config, "test-hash", rx).await.unwrap();
    cancel.await.unwrap();

    assert_eq!(summary.termination, TerminationCause::Cancelled);
    assert_eq!(summary.records_emitted, 0);
    assert!(emitted(&dir).is_empty());
}

#[tokio::test]
async fn test_page_in_declared_charset_is_decoded() {
    let server = MockServer::start().await;

    let markup = r#"<html><body><ul class="srp-results">
        <li class="s-item">
          <a class="s-item__link" href="/itm/100000001"><div class="s-item__title">Lampe élégante</div></a>
          <span class="s-item__price">$10.00</span>
        </li>
        <li class="s-item">
          <a class="s-item__link" href="/itm/100000002"><div class="s-item__title">Lampadaire café</div></a>
          <span class="s-item__price">$12.00</span>
        </li>
        </ul></body></html>"#;
    // Every character above is in Latin-1, one byte each
    let latin1: Vec<u8> = markup.chars().map(|c| c as u32 as u8).collect();

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(latin1, "text/html; charset=iso-8859-1"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), vec![format!("{}/sch/i.html?_nkw=lamp", server.uri())]);

    let summary = run(&config).await;

    assert_eq!(summary.fatal_failures, 0);
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.records_emitted, 2);

    let records = emitted(&dir);
    assert_eq!(records[0].title(), "Lampe élégante");
    assert_eq!(records[1].title(), "Lampadaire café");
}

/// Serves a result page after a delay and notes when each request arrived
struct SlowPage {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for SlowPage {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        let id = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "_nkw")
            .and_then(|(_, v)| v.parse::<u64>().ok())
            .unwrap_or(0);
        html(result_page(&[100_000_000 + id], None)).set_delay(self.delay)
    }
}

#[tokio::test]
async fn test_open_connections_stay_within_concurrency() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let delay = Duration::from_millis(400);

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(SlowPage {
            arrivals: Arc::clone(&arrivals),
            delay,
        })
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls = (1..=6)
        .map(|n| format!("{}/sch/i.html?_nkw={}", server.uri(), n))
        .collect();
    let mut config = create_test_config(dir.path(), urls);
    config.scraper.concurrency = 2;

    let started = Instant::now();
    let summary = run(&config).await;
    let elapsed = started.elapsed();

    assert_eq!(summary.records_emitted, 6);

    // A request still waiting for its response holds a connection, so a
    // request arriving less than `delay` after another overlaps it
    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 6);
    let peak = arrivals
        .iter()
        .map(|at| {
            arrivals
                .iter()
                .filter(|other| *other <= at && at.duration_since(**other) < delay / 2)
                .count()
        })
        .max()
        .unwrap();
    assert!(peak <= 2, "{} requests were open at once", peak);

    // Six requests two at a time need three rounds
    assert!(elapsed >= delay * 3, "run took only {:?}", elapsed);
}
