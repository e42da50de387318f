//! Output module: record sinks, fan-out and run reporting
//!
//! This module handles:
//! - Writing records as JSON, CSV, XML and SpreadsheetML
//! - Reading those files back into records
//! - Fanning records out to every writer with per-writer failure isolation
//! - Summarising a run on stdout and as a markdown report

mod csv;
mod dispatcher;
mod flat;
mod json;
mod markdown;
mod spreadsheet;
mod summary;
mod traits;
mod xml;

pub use self::csv::{read_csv, CsvSink};
pub use dispatcher::{DispatchReport, SinkDispatcher, WriterReport};
pub use flat::COLUMNS;
pub use json::{read_json, JsonSink};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use spreadsheet::{read_spreadsheet, SpreadsheetSink};
pub use summary::{print_summary, ExitStatus, RunSummary};
pub use traits::{OutputError, OutputResult, RecordSink};
pub use xml::{read_xml, XmlSink};

use crate::config::{OutputConfig, OutputFormat};
use crate::SiftError;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Path of a format's output file
///
/// `{directory}/{basename}[_{YYYYmmdd-HHMMSS}].{extension}`
///
/// # Example
///
/// ```
/// use chrono::Local;
/// use listing_sift::config::{OutputConfig, OutputFormat};
/// use listing_sift::output::output_path;
///
/// let config = OutputConfig {
///     directory: "out".to_string(),
///     timestamped: false,
///     ..Default::default()
/// };
/// let path = output_path(&config, OutputFormat::Csv, Local::now());
/// assert_eq!(path, std::path::Path::new("out/listings.csv"));
/// ```
pub fn output_path(config: &OutputConfig, format: OutputFormat, started_at: DateTime<Local>) -> PathBuf {
    let stem = if config.timestamped {
        format!("{}_{}", config.basename, started_at.format("%Y%m%d-%H%M%S"))
    } else {
        config.basename.clone()
    };
    Path::new(&config.directory).join(format!("{}.{}", stem, format.extension()))
}

fn open_sink(format: OutputFormat, path: &Path) -> OutputResult<Box<dyn RecordSink>> {
    Ok(match format {
        OutputFormat::Json => Box::new(JsonSink::create(path)?),
        OutputFormat::Csv => Box::new(CsvSink::create(path)?),
        OutputFormat::Xml => Box::new(XmlSink::create(path)?),
        OutputFormat::Spreadsheet => Box::new(SpreadsheetSink::create(path)?),
    })
}

/// Opens one writer per configured format
///
/// A writer that cannot be opened is recorded as a failed writer in the
/// returned dispatcher.
///
/// # Errors
///
/// `SiftError::NoWriters` when not a single writer could be opened.
pub fn open_sinks(config: &OutputConfig, started_at: DateTime<Local>) -> Result<SinkDispatcher, SiftError> {
    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        tracing::error!("Cannot create output directory {}: {}", config.directory, e);
    }

    let mut sinks = Vec::new();
    let mut failures = Vec::new();
    let mut opened = HashSet::new();
    for &format in &config.formats {
        // One writer per file
        if !opened.insert(format) {
            continue;
        }
        let path = output_path(config, format, started_at);
        match open_sink(format, &path) {
            Ok(sink) => {
                tracing::info!("Writing {} output to {}", format, path.display());
                sinks.push(sink);
            }
            Err(e) => failures.push((format, e)),
        }
    }

    let mut dispatcher = SinkDispatcher::new(sinks);
    for (format, error) in &failures {
        dispatcher.record_open_failure(&format.to_string(), error);
    }

    if dispatcher.active_writers() == 0 {
        return Err(SiftError::NoWriters);
    }
    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamped_paths() {
        let config = OutputConfig {
            directory: "data".to_string(),
            basename: "lamps".to_string(),
            ..Default::default()
        };
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(
            output_path(&config, OutputFormat::Json, at),
            Path::new("data/lamps_20240309-140507.json")
        );
        assert_eq!(
            output_path(&config, OutputFormat::Spreadsheet, at),
            Path::new("data/lamps_20240309-140507.spreadsheet.xml")
        );
    }

    #[test]
    fn test_open_sinks_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            directory: dir.path().join("nested").display().to_string(),
            timestamped: false,
            formats: vec![OutputFormat::Json, OutputFormat::Xml],
            ..Default::default()
        };

        let dispatcher = open_sinks(&config, Local::now()).unwrap();
        assert_eq!(dispatcher.active_writers(), 2);
        let report = dispatcher.finish();
        assert!(!report.has_failures());
        assert!(dir.path().join("nested/listings.json").exists());
        assert!(dir.path().join("nested/listings.xml").exists());
    }

    #[test]
    fn test_repeated_format_opens_one_writer() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            directory: dir.path().display().to_string(),
            timestamped: false,
            formats: vec![OutputFormat::Json, OutputFormat::Json],
            ..Default::default()
        };

        let dispatcher = open_sinks(&config, Local::now()).unwrap();
        assert_eq!(dispatcher.active_writers(), 1);
        assert_eq!(dispatcher.finish().writers.len(), 1);
    }

    #[test]
    fn test_no_writable_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = OutputConfig {
            directory: blocker.display().to_string(),
            formats: vec![OutputFormat::Csv],
            ..Default::default()
        };
        assert!(matches!(open_sinks(&config, Local::now()), Err(SiftError::NoWriters)));
    }
}
