//! CSV to bulk `create` body.
//!
//! Every data row becomes two ndjson lines: the `{"create": {}}` action and the
//! row as a JSON object keyed by the header names. Cells are kept as text; empty
//! or missing cells become `null`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use logging_timer::time;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::Formatter;
use tracing::debug;

use crate::error::{ImportError, Result};

pub const CREATE_ACTION: &[u8] = b"{\"create\": {}}\n";

/// One data row, borrowed against the shared header.
#[derive(Debug)]
pub struct Record<'a> {
    headers: &'a [String],
    cells: &'a StringRecord,
}

impl<'a> Record<'a> {
    pub fn new(headers: &'a [String], cells: &'a StringRecord) -> Self {
        Self { headers, cells }
    }

    fn cell(&self, idx: usize) -> Option<&str> {
        match self.cells.get(idx) {
            Some("") | None => None,
            Some(value) => Some(value),
        }
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (idx, header) in self.headers.iter().enumerate() {
            map.serialize_entry(header, &self.cell(idx))?;
        }
        map.end()
    }
}

#[derive(Debug, Default)]
pub struct BulkBody {
    content: String,
    records: usize,
}

impl BulkBody {
    pub fn get_content(&self) -> &str {
        &self.content
    }
    pub fn get_records(&self) -> usize {
        self.records
    }
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
    pub fn len(&self) -> usize {
        self.content.len()
    }
    pub fn into_content(self) -> String {
        self.content
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PayloadBuilder {
    ascii_only: bool,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self { ascii_only: true }
    }
}

impl PayloadBuilder {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    #[time("info")]
    pub fn build_from_path(&self, path: &Path) -> Result<BulkBody> {
        let file = File::open(path)
            .map_err(|e| ImportError::Data(format!("cannot open {:?}: {}", path, e)))?;
        self.build(file)
    }

    pub fn build<R: Read>(&self, reader: R) -> Result<BulkBody> {
        let mut out = Vec::new();
        let records = self.write_body(reader, &mut out)?;
        let content = String::from_utf8(out)
            .map_err(|e| ImportError::Data(format!("body is not valid UTF-8: {}", e)))?;
        Ok(BulkBody { content, records })
    }

    /// Streams the body into `out` and returns how many records were written.
    pub fn write_body<R: Read, W: Write>(&self, reader: R, mut out: W) -> Result<usize> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut row = StringRecord::new();
        if !rdr.read_record(&mut row)? {
            return Err(ImportError::Data("file has no header row".to_string()));
        }
        let headers = dedupe_headers(&row);
        debug!("Columns: {:?}", headers);

        let mut records = 0usize;
        while rdr.read_record(&mut row)? {
            if row.len() > headers.len() {
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                return Err(ImportError::Data(format!(
                    "line {} has {} fields, header has {}",
                    line,
                    row.len(),
                    headers.len()
                )));
            }
            out.write_all(CREATE_ACTION)?;
            self.write_record(&mut out, &Record::new(&headers, &row))?;
            out.write_all(b"\n")?;
            records += 1;
        }
        out.flush()?;

        Ok(records)
    }

    fn write_record<W: Write>(&self, out: &mut W, record: &Record) -> Result<()> {
        let formatter = NdjsonFormatter {
            ascii_only: self.ascii_only,
        };
        let mut ser = serde_json::Serializer::with_formatter(out, formatter);
        record
            .serialize(&mut ser)
            .map_err(|e| ImportError::Data(format!("cannot encode record: {}", e)))
    }
}

/// Blank names become `Unnamed: <idx>`; repeated names get a `.N` suffix so
/// no column is dropped from the object.
fn dedupe_headers(row: &StringRecord) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut headers: Vec<String> = Vec::with_capacity(row.len());
    for (idx, name) in row.iter().enumerate() {
        let name = if idx == 0 {
            name.trim_start_matches('\u{feff}')
        } else {
            name
        };
        let name = if name.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name.to_string()
        };
        let mut candidate = name.clone();
        let mut suffix = 0;
        while used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", name, suffix);
        }
        used.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}

/// `", "` and `": "` separators, optional `\uXXXX` escaping of non-ASCII text.
struct NdjsonFormatter {
    ascii_only: bool,
}

impl Formatter for NdjsonFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ascii_only || fragment.bytes().all(|b| b < 0x7f) {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch < '\u{7f}' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
