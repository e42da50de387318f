use super::dedup::Deduplicator;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// The configured maximum number of records was emitted
    MaxItemsReached,

    /// Every input ran out of pages
    FrontierExhausted,

    /// The user interrupted the run
    Cancelled,

    /// Too many requests failed fatally
    FatalErrorBudgetExhausted,
}

impl TerminationCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationCause::MaxItemsReached => "max items reached",
            TerminationCause::FrontierExhausted => "frontier exhausted",
            TerminationCause::Cancelled => "cancelled",
            TerminationCause::FatalErrorBudgetExhausted => "fatal-error budget exhausted",
        }
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened during the run, reported to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// A result or listing page was fetched and parsed
    PageVisited,

    /// A record passed deduplication and was handed to the sinks
    RecordEmitted,

    /// A record was dropped because its item number was already emitted
    DuplicateSuppressed,

    /// A listing fragment could not be turned into a record
    ParseAnomaly,

    /// A fetch failed in a way worth retrying
    TransientFailure,

    /// A request was abandoned; its input will not complete
    FatalFailure { input: usize },

    /// A listing page used for enrichment could not be fetched or parsed
    ItemPageFailure,
}

/// Process-wide counters and termination state of one run
///
/// Owned by the pipeline driver. Other components read the remaining budget
/// through a shared reference and report [`RunEvent`]s; only the driver
/// applies them.
#[derive(Debug)]
pub struct RunState {
    max_items: u32,
    items_emitted: u32,
    pages_visited: u32,
    parse_anomalies: u32,
    transient_failures: u32,
    fatal_failures: u32,
    item_page_failures: u32,
    duplicates_suppressed: u32,
    incomplete_inputs: BTreeSet<usize>,
    termination: Option<TerminationCause>,
    dedup: Arc<Deduplicator>,
}

impl RunState {
    pub fn new(max_items: u32) -> Self {
        Self {
            max_items,
            items_emitted: 0,
            pages_visited: 0,
            parse_anomalies: 0,
            transient_failures: 0,
            fatal_failures: 0,
            item_page_failures: 0,
            duplicates_suppressed: 0,
            incomplete_inputs: BTreeSet::new(),
            termination: None,
            dedup: Arc::new(Deduplicator::new()),
        }
    }

    /// Folds one event into the counters
    pub fn apply(&mut self, event: RunEvent) {
        match event {
            RunEvent::PageVisited => self.pages_visited += 1,
            RunEvent::RecordEmitted => self.items_emitted += 1,
            RunEvent::DuplicateSuppressed => self.duplicates_suppressed += 1,
            RunEvent::ParseAnomaly => self.parse_anomalies += 1,
            RunEvent::TransientFailure => self.transient_failures += 1,
            RunEvent::FatalFailure { input } => {
                self.fatal_failures += 1;
                self.incomplete_inputs.insert(input);
            }
            RunEvent::ItemPageFailure => self.item_page_failures += 1,
        }
    }

    /// Records the termination cause; the first cause recorded wins
    pub fn terminate(&mut self, cause: TerminationCause) {
        if self.termination.is_none() {
            tracing::info!("Run terminating: {}", cause);
            self.termination = Some(cause);
        }
    }

    /// Records still allowed before the item budget is spent
    pub fn remaining(&self) -> u32 {
        self.max_items.saturating_sub(self.items_emitted)
    }

    pub fn budget_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Shared handle to the run's deduplication set
    pub fn dedup(&self) -> &Arc<Deduplicator> {
        &self.dedup
    }

    pub fn max_items(&self) -> u32 {
        self.max_items
    }

    pub fn items_emitted(&self) -> u32 {
        self.items_emitted
    }

    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    pub fn parse_anomalies(&self) -> u32 {
        self.parse_anomalies
    }

    pub fn transient_failures(&self) -> u32 {
        self.transient_failures
    }

    pub fn fatal_failures(&self) -> u32 {
        self.fatal_failures
    }

    pub fn item_page_failures(&self) -> u32 {
        self.item_page_failures
    }

    pub fn duplicates_suppressed(&self) -> u32 {
        self.duplicates_suppressed
    }

    pub fn incomplete_inputs(&self) -> usize {
        self.incomplete_inputs.len()
    }

    pub fn termination(&self) -> Option<TerminationCause> {
        self.termination
    }
}
