//! XML writer and reader
//!
//! Document shape:
//!
//! ```xml
//! <listings>
//!   <listing>
//!     <url>…</url>
//!     <itemNumber>…</itemNumber>
//!     <categories><category>…</category></categories>
//!     …
//!     <whyToBuy><reason>…</reason></whyToBuy>
//!   </listing>
//! </listings>
//! ```
//!
//! Absent values are omitted rather than written as empty elements.

use super::flat::{record_from_fields, to_row, COLUMNS};
use super::traits::{OutputResult, RecordSink};
use crate::listing::ListingRecord;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const ROOT: &str = "listings";
const LISTING: &str = "listing";

pub struct XmlSink<W: Write + Send> {
    writer: Writer<W>,
    finished: bool,
}

impl XmlSink<BufWriter<File>> {
    pub fn create(path: &Path) -> OutputResult<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write + Send> XmlSink<W> {
    pub fn new(out: W) -> OutputResult<Self> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT)))?;
        Ok(Self {
            writer,
            finished: false,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn list(&mut self, name: &str, item: &str, values: &[String]) -> OutputResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        for value in values {
            text_element(&mut self.writer, item, value)?;
        }
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> OutputResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

impl<W: Write + Send> RecordSink for XmlSink<W> {
    fn name(&self) -> &str {
        "xml"
    }

    fn write(&mut self, record: &ListingRecord) -> OutputResult<()> {
        self.writer.write_event(Event::Start(BytesStart::new(LISTING)))?;

        for (column, value) in COLUMNS.iter().zip(to_row(record)) {
            match *column {
                "categories" => self.list("categories", "category", record.categories())?,
                "whyToBuy" => self.list("whyToBuy", "reason", record.why_to_buy())?,
                _ if value.is_empty() => {}
                _ => text_element(&mut self.writer, column, &value)?,
            }
        }

        self.writer.write_event(Event::End(BytesEnd::new(LISTING)))?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.finished {
            self.writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
            self.writer.get_mut().write_all(b"\n")?;
            self.finished = true;
        }
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

/// Reads every record from an XML file written by [`XmlSink`]
pub fn read_xml(path: &Path) -> OutputResult<Vec<ListingRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_listings(&content)
}

fn parse_listings(content: &str) -> OutputResult<Vec<ListingRecord>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut fields: Option<HashMap<String, String>> = None;
    let mut categories = Vec::new();
    let mut reasons = Vec::new();
    let mut current: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    LISTING => {
                        fields = Some(HashMap::new());
                        categories.clear();
                        reasons.clear();
                    }
                    ROOT | "categories" | "whyToBuy" => {}
                    _ => {
                        current = Some(name);
                        text.clear();
                    }
                }
            }
            Event::Text(t) => {
                if current.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == LISTING {
                    if let Some(row) = fields.take() {
                        let mut record = record_from_fields(&row)?;
                        record.categories = std::mem::take(&mut categories);
                        record.why_to_buy = std::mem::take(&mut reasons);
                        records.push(record);
                    }
                } else if current.as_deref() == Some(name.as_str()) {
                    current = None;
                    let value = std::mem::take(&mut text);
                    match name.as_str() {
                        "category" => categories.push(value),
                        "reason" => reasons.push(value),
                        _ => {
                            if let Some(row) = fields.as_mut() {
                                row.insert(name, value);
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}
