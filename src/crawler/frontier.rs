//! Frontier of page requests
//!
//! This module decides which pages remain to be fetched:
//! - Seeds one request per input (search URL, keyword × region, listing URL)
//! - Enqueues page N+1 of an input only after page N reported a continuation
//! - Requeues transient failures with a backoff delay
//! - Stops an input at its page limit and the whole run at the item budget
//!
//! The driver polls [`Frontier::next`]; the frontier never pushes work.

use crate::config::Config;
use crate::domain::{Domain, DomainRegistry, Region};
use crate::state::RunState;
use crate::url::{keyword_to_url, normalize_search_url, parse_http_url};
use crate::{ConfigError, SiftError};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// What a request's page is parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Search or category result page: many cards, may paginate
    Search,

    /// A single listing page: one record, never paginates
    Listing,
}

/// One fetch of one page
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Page to fetch
    pub url: Url,

    /// Storefront the page belongs to
    pub domain: Arc<Domain>,

    pub kind: RequestKind,

    /// Index of the input this page belongs to
    pub input: usize,

    /// 1-based page index within the input
    pub page: u32,

    /// 1-based attempt number
    pub attempt: u32,

    /// Proxy slot used by the previous attempt
    pub proxy: Option<usize>,

    /// Earliest time the fetch may start
    pub not_before: Option<Instant>,
}

impl PageRequest {
    fn seed(url: Url, domain: Arc<Domain>, kind: RequestKind, input: usize) -> Self {
        Self {
            url,
            domain,
            kind,
            input,
            page: 1,
            attempt: 1,
            proxy: None,
            not_before: None,
        }
    }

    /// Request for a card's listing page, fetched outside the frontier
    pub(crate) fn item_page(url: Url, domain: Arc<Domain>, input: usize) -> Self {
        Self::seed(url, domain, RequestKind::Listing, input)
    }

    pub fn region(&self) -> Region {
        self.domain.region
    }
}

/// Result of polling the frontier
#[derive(Debug)]
pub enum Next {
    /// A request to dispatch now
    Request(PageRequest),

    /// Nothing queued, but dispatched requests may still produce more
    Pending,

    /// No request is queued or outstanding; the run is over
    Done,
}

/// Ordered queue of page requests with per-input pagination limits
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<PageRequest>,
    outstanding: usize,
    visited: HashSet<(usize, String)>,
    max_pages_per_input: u32,
    page_delay: Duration,
    closed: bool,
}

impl Frontier {
    /// Creates a frontier over seed requests
    pub fn new(seeds: Vec<PageRequest>, max_pages_per_input: u32, page_delay: Duration) -> Self {
        let visited = seeds
            .iter()
            .map(|r| (r.input, r.url.to_string()))
            .collect();

        Self {
            queue: seeds.into(),
            outstanding: 0,
            visited,
            max_pages_per_input,
            page_delay,
            closed: false,
        }
    }

    /// Polls for the next request
    pub fn next(&mut self) -> Next {
        if self.closed {
            return Next::Done;
        }
        match self.queue.pop_front() {
            Some(request) => {
                self.outstanding += 1;
                Next::Request(request)
            }
            None if self.outstanding > 0 => Next::Pending,
            None => Next::Done,
        }
    }

    /// Resolves a fetched page and enqueues its continuation
    ///
    /// The next page is enqueued unless the item budget in `state` is spent,
    /// the page reported no continuation, the input reached its page limit or
    /// the continuation was already visited. Returns whether a request was
    /// enqueued.
    pub fn continue_input(
        &mut self,
        request: &PageRequest,
        next_page: Option<Url>,
        state: &RunState,
    ) -> bool {
        self.resolve();

        let Some(next_url) = next_page else {
            tracing::debug!("Input {} has no page after {}", request.input, request.page);
            return false;
        };
        if self.closed || state.budget_exhausted() {
            return false;
        }
        if request.page >= self.max_pages_per_input {
            tracing::info!(
                "Input {} reached the page limit of {}",
                request.input,
                self.max_pages_per_input
            );
            return false;
        }
        if !self.visited.insert((request.input, next_url.to_string())) {
            tracing::warn!("Pagination of input {} loops back to {}", request.input, next_url);
            return false;
        }

        let delay = (!self.page_delay.is_zero()).then(|| Instant::now() + self.page_delay);
        self.queue.push_back(PageRequest {
            url: next_url,
            domain: Arc::clone(&request.domain),
            kind: request.kind,
            input: request.input,
            page: request.page + 1,
            attempt: 1,
            proxy: None,
            not_before: delay,
        });
        true
    }

    /// Puts a transiently failed request back for another attempt
    pub fn requeue(&mut self, mut request: PageRequest, delay: Duration) {
        self.resolve();
        if self.closed {
            return;
        }
        request.attempt += 1;
        request.not_before = Some(Instant::now() + delay);
        self.queue.push_back(request);
    }

    /// Drops a request that cannot succeed
    pub fn abandon(&mut self, request: &PageRequest) {
        self.resolve();
        tracing::debug!("Abandoned {} of input {}", request.url, request.input);
    }

    /// Accounts for a dispatched request whose outcome was lost
    pub fn release_lost(&mut self) {
        self.resolve();
    }

    /// Stops issuing requests; every later poll returns `Done`
    pub fn close(&mut self) {
        if !self.queue.is_empty() {
            tracing::debug!("Closing frontier with {} queued requests", self.queue.len());
        }
        self.queue.clear();
        self.closed = true;
    }

    /// Number of queued requests
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of dispatched requests not yet resolved
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    fn resolve(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}

/// Builds the seed requests for every configured input
///
/// Search URLs and listing URLs use the storefront serving their host;
/// keywords are searched once per configured region. Inputs on unknown hosts
/// use the first configured region.
pub fn seed_requests(config: &Config, registry: &DomainRegistry) -> Result<Vec<PageRequest>, SiftError> {
    let regions = config
        .input
        .regions
        .iter()
        .map(|r| r.parse::<Region>())
        .collect::<Result<Vec<_>, _>>()?;
    let fallback = regions.first().copied().unwrap_or(Region::US);
    let domain_of = |region: Region| {
        registry
            .get(region)
            .ok_or_else(|| ConfigError::UnknownRegion(region.to_string()))
    };

    let mut seeds = Vec::new();

    for raw in &config.input.urls {
        let url = parse_http_url(raw)?;
        let domain = match registry.resolve(&url, fallback) {
            Some(domain) => domain,
            None => domain_of(fallback)?,
        };
        let url = normalize_search_url(&url);
        seeds.push(PageRequest::seed(url, domain, RequestKind::Search, seeds.len()));
    }

    for keyword in &config.input.keywords {
        for region in &regions {
            let domain = domain_of(*region)?;
            let url = keyword_to_url(domain.base_url, keyword)?;
            seeds.push(PageRequest::seed(url, domain, RequestKind::Search, seeds.len()));
        }
    }

    for raw in &config.input.listing_urls {
        let url = parse_http_url(raw)?;
        let domain = match registry.resolve(&url, fallback) {
            Some(domain) => domain,
            None => domain_of(fallback)?,
        };
        seeds.push(PageRequest::seed(url, domain, RequestKind::Listing, seeds.len()));
    }

    Ok(seeds)
}
