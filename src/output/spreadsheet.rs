//! Spreadsheet writer (Excel 2003 SpreadsheetML workbook)
//!
//! Produces a single worksheet named "Listings" with a header row and one
//! row per record. Every cell is written, so column positions are stable;
//! numeric columns use `ss:Type="Number"`. Excel and LibreOffice open the
//! file directly.

use super::flat::{record_from_fields, to_row, COLUMNS};
use super::traits::{OutputError, OutputResult, RecordSink};
use crate::listing::ListingRecord;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SHEET_NAME: &str = "Listings";
const NAMESPACE: &str = "urn:schemas-microsoft-com:office:spreadsheet";
const NUMERIC_COLUMNS: &[&str] = &["price", "wasPrice", "available", "sold"];

pub struct SpreadsheetSink<W: Write + Send> {
    writer: Writer<W>,
    finished: bool,
}

impl SpreadsheetSink<BufWriter<File>> {
    pub fn create(path: &Path) -> OutputResult<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write + Send> SpreadsheetSink<W> {
    pub fn new(out: W) -> OutputResult<Self> {
        let mut writer = Writer::new_with_indent(out, b' ', 1);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer
            .get_mut()
            .write_all(b"\n<?mso-application progid=\"Excel.Sheet\"?>")?;

        writer.write_event(Event::Start(
            BytesStart::new("Workbook").with_attributes([("xmlns", NAMESPACE), ("xmlns:ss", NAMESPACE)]),
        ))?;
        writer.write_event(Event::Start(
            BytesStart::new("Worksheet").with_attributes([("ss:Name", SHEET_NAME)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("Table")))?;

        let mut sink = Self {
            writer,
            finished: false,
        };
        let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
        sink.row(&header, false)?;
        Ok(sink)
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn row(&mut self, cells: &[String], typed: bool) -> OutputResult<()> {
        self.writer.write_event(Event::Start(BytesStart::new("Row")))?;
        for (column, value) in COLUMNS.iter().zip(cells) {
            if value.is_empty() {
                self.writer.write_event(Event::Empty(BytesStart::new("Cell")))?;
                continue;
            }
            let kind = if typed && NUMERIC_COLUMNS.contains(column) {
                "Number"
            } else {
                "String"
            };
            self.writer.write_event(Event::Start(BytesStart::new("Cell")))?;
            self.writer.write_event(Event::Start(
                BytesStart::new("Data").with_attributes([("ss:Type", kind)]),
            ))?;
            self.writer.write_event(Event::Text(BytesText::new(value)))?;
            self.writer.write_event(Event::End(BytesEnd::new("Data")))?;
            self.writer.write_event(Event::End(BytesEnd::new("Cell")))?;
        }
        self.writer.write_event(Event::End(BytesEnd::new("Row")))?;
        Ok(())
    }
}

impl<W: Write + Send> RecordSink for SpreadsheetSink<W> {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn write(&mut self, record: &ListingRecord) -> OutputResult<()> {
        self.row(&to_row(record), true)
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.finished {
            for name in ["Table", "Worksheet", "Workbook"] {
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            self.writer.get_mut().write_all(b"\n")?;
            self.finished = true;
        }
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

/// Reads every record from a workbook written by [`SpreadsheetSink`]
pub fn read_spreadsheet(path: &Path) -> OutputResult<Vec<ListingRecord>> {
    let content = std::fs::read_to_string(path)?;
    let mut rows = parse_rows(&content)?.into_iter();

    let header = rows
        .next()
        .ok_or_else(|| OutputError::Format("workbook has no header row".to_string()))?;

    rows.map(|row| {
        let fields: HashMap<String, String> = header.iter().cloned().zip(row).collect();
        record_from_fields(&fields)
    })
    .collect()
}

fn parse_rows(content: &str) -> OutputResult<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut rows = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut in_data = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Row" => row = Some(Vec::new()),
                b"Cell" => {
                    if let Some(cells) = row.as_mut() {
                        cells.push(String::new());
                    }
                }
                b"Data" => in_data = true,
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"Cell" {
                    if let Some(cells) = row.as_mut() {
                        cells.push(String::new());
                    }
                }
            }
            Event::Text(t) => {
                if in_data {
                    let value = t.unescape()?;
                    if let Some(cell) = row.as_mut().and_then(|cells| cells.last_mut()) {
                        cell.push_str(&value);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Row" => {
                    if let Some(cells) = row.take() {
                        rows.push(cells);
                    }
                }
                b"Data" => in_data = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use crate::listing::ListingDraft;

    fn record() -> ListingRecord {
        ListingDraft {
            url: Some("https://www.ebay.com.au/itm/395566778899".to_string()),
            item_number: Some("395566778899".to_string()),
            categories: vec!["Home".to_string(), "Lighting".to_string()],
            title: Some("Floor Lamp".to_string()),
            price: Some(89.95),
            available: Some(4),
            available_text: Some("4 available".to_string()),
            ..Default::default()
        }
        .finish(&Currency {
            code: "AUD",
            symbol: "$",
        })
        .unwrap()
    }

    fn render(records: &[ListingRecord]) -> String {
        let mut sink = SpreadsheetSink::new(Vec::new()).unwrap();
        for record in records {
            sink.write(record).unwrap();
        }
        sink.finish().unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_workbook_structure() {
        let xml = render(&[record()]);

        assert!(xml.contains("<?mso-application progid=\"Excel.Sheet\"?>"));
        assert!(xml.contains("<Worksheet ss:Name=\"Listings\">"));
        assert!(xml.contains("<Data ss:Type=\"Number\">89.95</Data>"));
        assert!(xml.trim_end().ends_with("</Workbook>"));
    }

    #[test]
    fn test_rows_keep_column_positions() {
        let xml = render(&[record()]);
        let rows = parse_rows(&xml).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), COLUMNS.len());
        assert_eq!(rows[1].len(), COLUMNS.len());
        assert_eq!(rows[1][2], "Home > Lighting");
        assert_eq!(rows[1][4], "");
        assert_eq!(rows[1][10], "4");
    }
}
