//! CSV writer and reader

use super::flat::{record_from_fields, to_row, COLUMNS};
use super::traits::{OutputResult, RecordSink};
use crate::listing::ListingRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes one header row followed by one row per record
pub struct CsvSink<W: Write + Send> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> OutputResult<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write + Send> CsvSink<W> {
    pub fn new(out: W) -> OutputResult<Self> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(COLUMNS)?;
        Ok(Self { writer })
    }
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&mut self, record: &ListingRecord) -> OutputResult<()> {
        self.writer.write_record(to_row(record))?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads every record from a CSV file written by [`CsvSink`]
pub fn read_csv(path: &Path) -> OutputResult<Vec<ListingRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();
        records.push(record_from_fields(&fields)?);
    }
    Ok(records)
}
