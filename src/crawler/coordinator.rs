//! Pipeline driver - main run orchestration logic
//!
//! This module contains the loop that ties the pipeline together:
//! - Polls the frontier and dispatches every ready request as a task
//! - Folds each task's report into the run state
//! - Deduplicates records and hands them to the sinks, truncating at the
//!   item budget
//! - Requeues transient failures and abandons fatal ones
//! - Stops on max items, an exhausted frontier, cancellation or the fatal
//!   error budget, then closes every writer
//!
//! Only the driver mutates `RunState`. Tasks fetch and parse; they never
//! emit records themselves.

use super::backoff::ExponentialBackoff;
use super::fetcher::{FetchError, RawPage, RequestExecutor};
use super::frontier::{Frontier, Next, PageRequest, RequestKind};
use crate::config::Config;
use crate::domain::Domain;
use crate::listing::ListingRecord;
use crate::output::{DispatchReport, SinkDispatcher};
use crate::parser::{self, ParseAnomaly, ParsedPage};
use crate::state::{Deduplicator, RunEvent, RunState, TerminationCause};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{Id, JoinError, JoinSet};
use url::Url;

/// What a fetched page turned into
#[derive(Debug)]
enum PageContent {
    Search(ParsedPage),
    Listing(Result<ListingRecord, ParseAnomaly>),
}

/// Failures met while fetching listing pages for enrichment
#[derive(Debug, Default, Clone, Copy)]
struct EnrichmentStats {
    transient: u32,
    failures: u32,
}

/// Outcome of one dispatched request
#[derive(Debug)]
struct PageReport {
    request: PageRequest,
    outcome: Result<PageContent, FetchError>,
    enrichment: EnrichmentStats,
}

/// Everything a page task needs, detached from the driver
#[derive(Clone)]
struct TaskContext {
    executor: Arc<RequestExecutor>,
    dedup: Arc<Deduplicator>,
    backoff: ExponentialBackoff,
    max_attempts: u32,
    follow_item_page: bool,

    /// Remaining item budget when the task was dispatched
    budget: u32,
}

/// Main pipeline driver structure
pub struct Coordinator {
    executor: Arc<RequestExecutor>,
    frontier: Frontier,
    state: RunState,
    sinks: SinkDispatcher,
    backoff: ExponentialBackoff,
    max_attempts: u32,
    max_fatal_errors: u32,
    follow_item_page: bool,
}

impl Coordinator {
    /// Creates a driver over seed requests and opened sinks
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    /// * `executor` - Executor shared by every page task
    /// * `seeds` - Page-1 requests of every input
    /// * `sinks` - Dispatcher over the opened writers
    pub fn new(
        config: &Config,
        executor: RequestExecutor,
        seeds: Vec<PageRequest>,
        sinks: SinkDispatcher,
    ) -> Self {
        Self {
            executor: Arc::new(executor),
            frontier: Frontier::new(
                seeds,
                config.scraper.max_pages_per_input,
                Duration::from_millis(config.scraper.page_delay_ms),
            ),
            state: RunState::new(config.scraper.max_items),
            sinks,
            backoff: ExponentialBackoff::from_config(&config.retry),
            max_attempts: config.retry.max_attempts.max(1),
            max_fatal_errors: config.scraper.max_fatal_errors,
            follow_item_page: config.scraper.follow_item_page,
        }
    }

    /// Runs the main pipeline loop until a termination cause is recorded
    ///
    /// Setting `shutdown` to true cancels the run. In-flight requests are
    /// aborted once the loop ends and every writer is finished on every
    /// exit path.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> (RunState, DispatchReport) {
        let mut tasks: JoinSet<PageReport> = JoinSet::new();
        // Input of every running task, so a task that dies still counts
        let mut inputs: HashMap<Id, usize> = HashMap::new();
        let mut watching = true;

        loop {
            if self.state.termination().is_some() {
                break;
            }
            if *shutdown.borrow() {
                tracing::warn!("Cancellation requested");
                self.state.terminate(TerminationCause::Cancelled);
                break;
            }

            let exhausted = loop {
                match self.frontier.next() {
                    Next::Request(request) => {
                        let input = request.input;
                        let ctx = self.task_context();
                        let handle = tasks.spawn(process_request(request, ctx));
                        inputs.insert(handle.id(), input);
                    }
                    Next::Pending => break false,
                    Next::Done => break true,
                }
            };
            if exhausted {
                self.state.terminate(TerminationCause::FrontierExhausted);
                break;
            }

            tokio::select! {
                joined = tasks.join_next_with_id() => match joined {
                    Some(Ok((id, report))) => {
                        inputs.remove(&id);
                        self.fold(report);
                    }
                    Some(Err(e)) => {
                        let input = inputs.remove(&e.id());
                        self.fold_lost(input, &e);
                    }
                    None => {}
                },
                changed = shutdown.changed(), if watching => {
                    // A dropped sender can no longer cancel the run
                    if changed.is_err() {
                        watching = false;
                    }
                }
            }
        }

        if !tasks.is_empty() {
            tracing::info!("Aborting {} in-flight requests", tasks.len());
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
        self.frontier.close();

        tracing::info!(
            "Run finished: {} records from {} pages ({})",
            self.state.items_emitted(),
            self.state.pages_visited(),
            self.state
                .termination()
                .unwrap_or(TerminationCause::FrontierExhausted)
        );

        let report = self.sinks.finish();
        (self.state, report)
    }

    fn task_context(&self) -> TaskContext {
        TaskContext {
            executor: Arc::clone(&self.executor),
            dedup: Arc::clone(self.state.dedup()),
            backoff: self.backoff,
            max_attempts: self.max_attempts,
            follow_item_page: self.follow_item_page,
            budget: self.state.remaining(),
        }
    }

    /// Folds one task report into the run state
    fn fold(&mut self, report: PageReport) {
        let PageReport {
            request,
            outcome,
            enrichment,
        } = report;

        for _ in 0..enrichment.transient {
            self.state.apply(RunEvent::TransientFailure);
        }
        for _ in 0..enrichment.failures {
            self.state.apply(RunEvent::ItemPageFailure);
        }

        match outcome {
            Ok(PageContent::Search(parsed)) => {
                self.state.apply(RunEvent::PageVisited);
                tracing::debug!(
                    "Page {} of input {}: {} records, {} anomalies",
                    request.page,
                    request.input,
                    parsed.records.len(),
                    parsed.anomalies.len()
                );
                for anomaly in &parsed.anomalies {
                    self.record_anomaly(&request, anomaly);
                }
                self.emit_all(parsed.records);
                self.frontier
                    .continue_input(&request, parsed.next_page, &self.state);
            }
            Ok(PageContent::Listing(result)) => {
                self.state.apply(RunEvent::PageVisited);
                match result {
                    Ok(record) => self.emit_all(vec![record]),
                    Err(anomaly) => self.record_anomaly(&request, &anomaly),
                }
                self.frontier.continue_input(&request, None, &self.state);
            }
            Err(error) if error.is_transient() => {
                self.state.apply(RunEvent::TransientFailure);
                if request.attempt < self.max_attempts {
                    let delay = self.backoff.delay(request.attempt);
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        error,
                        request.attempt,
                        self.max_attempts,
                        delay
                    );
                    self.frontier.requeue(request, delay);
                } else {
                    tracing::error!(
                        "{}; giving up after {} attempts",
                        error,
                        request.attempt
                    );
                    self.state.apply(RunEvent::FatalFailure {
                        input: request.input,
                    });
                    self.frontier.abandon(&request);
                }
            }
            Err(error) => {
                tracing::error!("{}", error);
                self.state.apply(RunEvent::FatalFailure {
                    input: request.input,
                });
                self.frontier.abandon(&request);
            }
        }

        self.check_fatal_budget();
    }

    /// Folds a page task that ended without a report
    ///
    /// The request is gone, so its input counts as fatally failed.
    fn fold_lost(&mut self, input: Option<usize>, error: &JoinError) {
        self.frontier.release_lost();
        match input {
            Some(input) => {
                tracing::error!("Page task of input {} failed: {}", input, error);
                self.state.apply(RunEvent::FatalFailure { input });
            }
            None => tracing::error!("Page task failed: {}", error),
        }
        self.check_fatal_budget();
    }

    fn check_fatal_budget(&mut self) {
        if self.state.fatal_failures() >= self.max_fatal_errors {
            self.state
                .terminate(TerminationCause::FatalErrorBudgetExhausted);
        }
    }

    fn record_anomaly(&mut self, request: &PageRequest, anomaly: &ParseAnomaly) {
        tracing::warn!("Skipping listing on {}: {}", request.url, anomaly);
        self.state.apply(RunEvent::ParseAnomaly);
    }

    /// Deduplicates and emits records in page order, stopping at the budget
    fn emit_all(&mut self, records: Vec<ListingRecord>) {
        for record in records {
            if self.state.budget_exhausted() {
                break;
            }
            if self.state.dedup().accept(&record) {
                self.sinks.emit(&record);
                self.state.apply(RunEvent::RecordEmitted);
            } else {
                tracing::debug!("Duplicate item {} suppressed", record.item_number());
                self.state.apply(RunEvent::DuplicateSuppressed);
            }
        }

        if self.state.budget_exhausted() {
            self.state.terminate(TerminationCause::MaxItemsReached);
        }
    }
}

/// Fetches and parses one request; runs as its own task
async fn process_request(mut request: PageRequest, ctx: TaskContext) -> PageReport {
    if let Some(at) = request.not_before {
        tokio::time::sleep_until(at).await;
    }

    let mut enrichment = EnrichmentStats::default();
    let outcome = match ctx.executor.fetch(&mut request).await {
        Ok(page) => match request.kind {
            RequestKind::Search => {
                let mut parsed = parser::parse(&page, &request.domain);
                if ctx.follow_item_page {
                    let records = std::mem::take(&mut parsed.records);
                    parsed.records =
                        enrich(&ctx, &request.domain, request.input, records, &mut enrichment)
                            .await;
                }
                Ok(PageContent::Search(parsed))
            }
            RequestKind::Listing => Ok(PageContent::Listing(parser::parse_listing(
                &page,
                &request.domain,
            ))),
        },
        Err(e) => Err(e),
    };

    PageReport {
        request,
        outcome,
        enrichment,
    }
}

/// Fills card records from their listing pages
///
/// At most `ctx.budget` records are enriched; records already emitted by an
/// earlier page are passed through untouched. A failed listing page keeps
/// the card record.
async fn enrich(
    ctx: &TaskContext,
    domain: &Arc<Domain>,
    input: usize,
    records: Vec<ListingRecord>,
    stats: &mut EnrichmentStats,
) -> Vec<ListingRecord> {
    let mut left = ctx.budget;
    let mut enriched = Vec::with_capacity(records.len());

    for record in records {
        if left == 0 || ctx.dedup.contains(record.item_number()) {
            enriched.push(record);
            continue;
        }
        left -= 1;

        match fetch_item_page(ctx, domain, input, record.url(), stats).await {
            Ok(page) => {
                let detail = domain.parser().parse_item(&page, domain);
                enriched.push(record.enriched_with(&detail));
            }
            Err(e) => {
                tracing::warn!("Keeping card data for {}: {}", record.item_number(), e);
                stats.failures += 1;
                enriched.push(record);
            }
        }
    }

    enriched
}

/// Fetches a listing page with the run's retry policy
async fn fetch_item_page(
    ctx: &TaskContext,
    domain: &Arc<Domain>,
    input: usize,
    url: &str,
    stats: &mut EnrichmentStats,
) -> Result<RawPage, FetchError> {
    let url = Url::parse(url).map_err(|e| FetchError::Fatal {
        url: url.to_string(),
        status: None,
        reason: e.to_string(),
    })?;
    let mut request = PageRequest::item_page(url, Arc::clone(domain), input);

    loop {
        match ctx.executor.fetch(&mut request).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_transient() => {
                stats.transient += 1;
                if request.attempt >= ctx.max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(ctx.backoff.delay(request.attempt)).await;
                request.attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
