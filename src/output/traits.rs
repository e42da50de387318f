//! Record sink trait and output errors
//!
//! Every output format implements [`RecordSink`]. Sinks own their files and
//! buffering; the dispatcher only offers records and finally asks each sink
//! to finish.

use crate::listing::ListingRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A destination for listing records
///
/// Implementations must accept records in emission order and must be able
/// to `finish` after any number of writes (including none), leaving a
/// well-formed file behind.
pub trait RecordSink: Send {
    /// Short name used in logs and the run summary (e.g. "json")
    fn name(&self) -> &str;

    /// Writes one record
    ///
    /// # Arguments
    ///
    /// * `record` - The record to serialise
    fn write(&mut self, record: &ListingRecord) -> OutputResult<()>;

    /// Closes the document and flushes buffered data
    fn finish(&mut self) -> OutputResult<()>;
}
