//! JSON writer: a pretty-printed array streamed one record at a time

use super::traits::{OutputResult, RecordSink};
use crate::listing::ListingRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct JsonSink<W: Write + Send> {
    out: W,
    count: usize,
    finished: bool,
}

impl JsonSink<BufWriter<File>> {
    /// Creates (truncating) the file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(mut out: W) -> OutputResult<Self> {
        out.write_all(b"[")?;
        Ok(Self {
            out,
            count: 0,
            finished: false,
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RecordSink for JsonSink<W> {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&mut self, record: &ListingRecord) -> OutputResult<()> {
        let body = serde_json::to_string_pretty(record)?;
        let separator = if self.count == 0 { "\n" } else { ",\n" };
        self.out.write_all(separator.as_bytes())?;

        // Indent the object one level inside the array
        for (i, line) in body.lines().enumerate() {
            if i > 0 {
                self.out.write_all(b"\n")?;
            }
            self.out.write_all(b"  ")?;
            self.out.write_all(line.as_bytes())?;
        }

        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.finished {
            let close = if self.count == 0 { "]\n" } else { "\n]\n" };
            self.out.write_all(close.as_bytes())?;
            self.finished = true;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Reads every record from a JSON array file
pub fn read_json(path: &Path) -> OutputResult<Vec<ListingRecord>> {
    let file = File::open(path)?;
    let records = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(records)
}
