use crate::listing::ListingRecord;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Suppresses listings whose item number was already seen in this run
///
/// The first occurrence of an item number wins; later occurrences are
/// dropped without comparing their fields. Membership lives only as long as
/// the run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashSet<String>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a record's item number is offered
    pub fn accept(&self, record: &ListingRecord) -> bool {
        self.accept_key(record.item_number())
    }

    /// Atomically checks and records an item number
    pub fn accept_key(&self, item_number: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.insert(item_number.to_string())
    }

    /// Checks membership without recording
    pub fn contains(&self, item_number: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(item_number)
    }

    /// Number of distinct item numbers accepted
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
