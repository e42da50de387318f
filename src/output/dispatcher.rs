//! Sink Dispatcher
//!
//! Fans every accepted record out to all configured writers. A writer that
//! fails is reported once, marked failed and skipped for the rest of the
//! run; the other writers keep receiving records.

use super::traits::{OutputError, RecordSink};
use crate::listing::ListingRecord;

struct Slot {
    sink: Box<dyn RecordSink>,
    records_written: usize,
    error: Option<String>,
}

/// Per-writer outcome reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterReport {
    pub name: String,
    pub records_written: usize,

    /// First failure of this writer, if any
    pub error: Option<String>,
}

impl WriterReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of all writers after `finish`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub writers: Vec<WriterReport>,
}

impl DispatchReport {
    pub fn has_failures(&self) -> bool {
        self.writers.iter().any(WriterReport::failed)
    }

    pub fn failed_writers(&self) -> impl Iterator<Item = &WriterReport> {
        self.writers.iter().filter(|w| w.failed())
    }
}

pub struct SinkDispatcher {
    slots: Vec<Slot>,

    /// Writers that could not even be opened
    unopened: Vec<WriterReport>,
}

impl SinkDispatcher {
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self {
            slots: sinks
                .into_iter()
                .map(|sink| Slot {
                    sink,
                    records_written: 0,
                    error: None,
                })
                .collect(),
            unopened: Vec::new(),
        }
    }

    /// Records a writer that failed to open, so the run summary reports it
    pub fn record_open_failure(&mut self, name: &str, error: &OutputError) {
        tracing::error!("Failed to open {} writer: {}", name, error);
        self.unopened.push(WriterReport {
            name: name.to_string(),
            records_written: 0,
            error: Some(error.to_string()),
        });
    }

    /// Number of writers still accepting records
    pub fn active_writers(&self) -> usize {
        self.slots.iter().filter(|s| s.error.is_none()).count()
    }

    /// Offers one record to every healthy writer, in registration order
    pub fn emit(&mut self, record: &ListingRecord) {
        for slot in self.slots.iter_mut().filter(|s| s.error.is_none()) {
            match slot.sink.write(record) {
                Ok(()) => slot.records_written += 1,
                Err(e) => {
                    tracing::error!(
                        "{} writer failed on item {}: {}; skipping it for the rest of the run",
                        slot.sink.name(),
                        record.item_number(),
                        e
                    );
                    slot.error = Some(e.to_string());
                }
            }
        }
    }

    /// Closes every writer and reports how each one fared
    ///
    /// Failed writers are still asked to finish so their file handles are
    /// released; a finish error on a healthy writer marks it failed.
    pub fn finish(self) -> DispatchReport {
        let mut writers = self.unopened;

        for mut slot in self.slots {
            if let Err(e) = slot.sink.finish() {
                if slot.error.is_none() {
                    tracing::error!("{} writer failed to finish: {}", slot.sink.name(), e);
                    slot.error = Some(e.to_string());
                }
            }
            writers.push(WriterReport {
                name: slot.sink.name().to_string(),
                records_written: slot.records_written,
                error: slot.error,
            });
        }

        DispatchReport { writers }
    }
}
