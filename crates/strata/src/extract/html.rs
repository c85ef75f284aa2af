//! HTML `<table>` detection.
//!
//! Tables are scanned with a lenient pull parser: end tag names are not
//! checked, unmatched end tags are ignored, and a parse error ends the scan
//! of the current table region. A `<` that cannot open markup (`1 < 2`) is
//! kept as cell text, and named or numeric entities are decoded leniently.
//! Nested tables are reported separately and do not contribute cells to the
//! enclosing table.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use regex::{Captures, Regex};
use serde_json::Value;

use super::CharOffsets;
use crate::fragment::{Fragment, FragmentKind, Record};

static TABLE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table\b").expect("valid table pattern"));

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("valid entity pattern"));

/// A table as rows of cell text, with byte positions relative to the scan start.
#[derive(Debug)]
struct ScannedTable {
    start: usize,
    end: usize,
    rows: Vec<Vec<String>>,
}

#[derive(Debug)]
struct TableBuilder {
    start: usize,
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
    /// Raw text of the open cell since the last tag.
    pending: String,
}

impl TableBuilder {
    fn new(start: usize) -> Self {
        Self {
            start,
            rows: Vec::new(),
            row: None,
            cell: None,
            pending: String::new(),
        }
    }

    fn open_row(&mut self) {
        self.close_row();
        self.row = Some(Vec::new());
    }

    /// Cells outside a `<tr>` are ignored.
    fn open_cell(&mut self) {
        self.close_cell();
        if self.row.is_some() {
            self.cell = Some(String::new());
        }
    }

    fn push_raw(&mut self, text: &str) {
        if self.cell.is_some() {
            self.pending.push_str(text);
        }
    }

    fn push_literal(&mut self, text: &str) {
        self.flush_text();
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text.trim());
        }
    }

    /// Each run of text between two tags is decoded and trimmed on its own.
    fn flush_text(&mut self) {
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(decode_entities(&self.pending).trim());
        }
        self.pending.clear();
    }

    fn close_cell(&mut self) {
        self.flush_text();
        if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
            row.push(cell);
        }
    }

    fn close_row(&mut self) {
        self.close_cell();
        if let Some(row) = self.row.take() {
            if !row.is_empty() {
                self.rows.push(row);
            }
        }
    }

    fn finish(mut self, end: usize) -> ScannedTable {
        self.close_row();
        ScannedTable {
            start: self.start,
            end,
            rows: self.rows,
        }
    }
}

/// Find every `<table>` with a header row and at least one data row.
///
/// The first row is always the header. Each later row is zipped with it
/// positionally, so a row shorter or longer than the header yields only as
/// many fields as the shorter of the two.
pub fn extract_html_tables(text: &str) -> Vec<Fragment> {
    let mut scanned = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(open) = TABLE_OPEN.find_at(text, cursor) else {
            break;
        };
        let base = open.start();
        let (tables, consumed) = scan_region(&text[base..]);
        scanned.extend(tables.into_iter().map(|t| ScannedTable {
            start: base + t.start,
            end: base + t.end,
            rows: t.rows,
        }));
        cursor = next_char_boundary(text, base + consumed.max(open.len()));
    }

    scanned.sort_by_key(|t| t.start);

    let offsets = CharOffsets::new(text);
    scanned
        .into_iter()
        .filter_map(|table| {
            let span = offsets.span(table.start, table.end);
            table_records(table.rows)
                .map(|records| Fragment::records(FragmentKind::Html, Some(span), records))
        })
        .collect()
}

fn next_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}

/// Zip each data row against the header row.
fn table_records(mut rows: Vec<Vec<String>>) -> Option<Vec<Record>> {
    if rows.len() <= 1 {
        return None;
    }
    let header = rows.remove(0);
    Some(
        rows.into_iter()
            .map(|row| {
                header
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), Value::String(cell)))
                    .collect::<Record>()
            })
            .collect(),
    )
}

/// Decode `&name;` and `&#nn;` references. Unknown ones stay as written.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    ENTITY.replace_all(raw, |caps: &Captures<'_>| {
        let entity = &caps[0];
        unescape_with(entity, resolve_html5_entity)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| entity.to_string())
    })
}

/// Returns true if a start tag name can begin real markup.
fn is_tag_name(name: &[u8]) -> bool {
    name.first().is_some_and(u8::is_ascii_alphabetic)
}

/// Byte position of the next `<` that opens markup, or the end of the text.
fn next_markup(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let opens_markup = |b: u8| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?');
    (from..bytes.len())
        .find(|&i| bytes[i] == b'<' && bytes.get(i + 1).copied().is_some_and(opens_markup))
        .unwrap_or(bytes.len())
}

fn lenient_reader(text: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.check_comments = false;
    reader
}

/// Scan from an opening `<table` until every table opened in the region is closed.
///
/// Returns the tables found and the number of bytes consumed.
fn scan_region(region: &str) -> (Vec<ScannedTable>, usize) {
    // The reader restarts after stray text, so positions are `base` plus its own.
    let mut base = 0;
    let mut reader = lenient_reader(region);

    let mut open: Vec<TableBuilder> = Vec::new();
    let mut done = Vec::new();

    loop {
        let before = base + reader.buffer_position() as usize;
        let event = reader.read_event();

        if let Ok(Event::Start(e) | Event::Empty(e)) = &event {
            if !is_tag_name(e.name().as_ref()) {
                let next = next_markup(region, before + 1);
                if let Some(table) = open.last_mut() {
                    table.push_raw(&region[before..next]);
                }
                base = next;
                reader = lenient_reader(&region[next..]);
                continue;
            }
        }
        if matches!(event, Ok(Event::Start(_) | Event::Empty(_) | Event::End(_))) {
            if let Some(table) = open.last_mut() {
                table.flush_text();
            }
        }

        match event {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"table" => open.push(TableBuilder::new(before)),
                    b"tr" => {
                        if let Some(table) = open.last_mut() {
                            table.open_row();
                        }
                    }
                    b"td" | b"th" => {
                        if let Some(table) = open.last_mut() {
                            table.open_cell();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                if matches!(name.as_slice(), b"td" | b"th") {
                    if let Some(table) = open.last_mut() {
                        table.open_cell();
                        table.close_cell();
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"table" => {
                        if let Some(table) = open.pop() {
                            let end = base + reader.buffer_position() as usize;
                            done.push(table.finish(end));
                            if open.is_empty() {
                                return (done, end);
                            }
                        }
                    }
                    b"tr" => {
                        if let Some(table) = open.last_mut() {
                            table.close_row();
                        }
                    }
                    b"td" | b"th" => {
                        if let Some(table) = open.last_mut() {
                            table.close_cell();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(table) = open.last_mut() {
                    table.push_raw(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(table) = open.last_mut() {
                    table.push_literal(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(offset = before, error = %e, "stopping HTML table scan");
                break;
            }
        }
    }

    let end = (base + reader.buffer_position() as usize).min(region.len());
    while let Some(table) = open.pop() {
        done.push(table.finish(end));
    }
    (done, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_table() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr>\
                    <tr><td>Ann</td><td>31</td></tr>\
                    <tr><td>Raj</td><td>28</td></tr></table>";
        let blocks = extract_html_tables(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].record_count(), 2);
        assert_eq!(blocks[0].rows()[0]["Name"], json!("Ann"));
        assert_eq!(blocks[0].rows()[1]["Age"], json!("28"));
        assert_eq!(blocks[0].start_offset(), Some(0));
        assert_eq!(blocks[0].end_offset(), Some(html.len()));
    }

    #[test]
    fn test_short_row_truncates_to_row_length() {
        let html = "<table>\
                    <tr><th>a</th><th>b</th><th>c</th><th>d</th></tr>\
                    <tr><td>1</td><td>2</td></tr>\
                    </table>";
        let blocks = extract_html_tables(html);
        let row = &blocks[0].rows()[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row["a"], json!("1"));
        assert_eq!(row["b"], json!("2"));
    }

    #[test]
    fn test_long_row_truncates_to_header_length() {
        let html = "<table><tr><th>a</th></tr><tr><td>1</td><td>2</td></tr></table>";
        let blocks = extract_html_tables(html);
        assert_eq!(blocks[0].rows()[0].len(), 1);
    }

    #[test]
    fn test_header_only_table_is_skipped() {
        assert!(extract_html_tables("<table><tr><th>only</th></tr></table>").is_empty());
        assert!(extract_html_tables("<table></table>").is_empty());
    }

    #[test]
    fn test_tables_inside_prose() {
        let text = "Report for Q1 & Q2 (a < b)\n\
                    <TABLE class=\"grid\"><THEAD><TR><TH>Region</TH><TH>Sales</TH></TR></THEAD>\
                    <TBODY><TR><TD><b>North</b> &amp; East</TD><TD>10</TD></TR></TBODY></TABLE>\n\
                    Between tables.\n\
                    <table><tr><td>k</td></tr><tr><td>v<br>w</td></tr></table>";
        let blocks = extract_html_tables(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rows()[0]["Region"], json!("North& East"));
        assert_eq!(blocks[0].rows()[0]["Sales"], json!("10"));
        assert_eq!(blocks[1].rows()[0]["k"], json!("vw"));
        assert!(blocks[0].start_offset() < blocks[1].start_offset());
    }

    #[test]
    fn test_unclosed_table_is_flushed() {
        let blocks = extract_html_tables("<table><tr><td>h</td></tr><tr><td>1</td>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].rows()[0]["h"], json!("1"));
    }

    #[test]
    fn test_no_tables() {
        assert!(extract_html_tables("plain text with <b>markup</b>").is_empty());
        assert!(extract_html_tables("").is_empty());
    }

    #[test]
    fn test_literal_less_than_stays_in_cell() {
        let html = "<table><tr><th>n</th></tr>\
                    <tr><td>1 < 2</td></tr><tr><td>3</td></tr></table>";
        let blocks = extract_html_tables(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].record_count(), 2);
        assert_eq!(blocks[0].rows()[0]["n"], json!("1 < 2"));
        assert_eq!(blocks[0].rows()[1]["n"], json!("3"));
        assert_eq!(blocks[0].end_offset(), Some(html.len()));
    }

    #[test]
    fn test_html_entities_are_decoded() {
        let html = "<table><tr><th>a&nbsp;b</th><th>c</th></tr>\
                    <tr><td>x &lt;= y&#33;</td><td>R&D &copy;</td></tr></table>";
        let blocks = extract_html_tables(html);
        let row = &blocks[0].rows()[0];
        assert_eq!(row["a\u{a0}b"], json!("x <= y!"));
        assert_eq!(row["c"], json!("R&D \u{a9}"));
    }

    #[test]
    fn test_nested_table_is_separate() {
        let html = "<table><tr><td>h</td></tr><tr><td>\
                    <table><tr><td>i</td></tr><tr><td>j</td></tr></table>\
                    </td></tr></table>";
        let blocks = extract_html_tables(html);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rows()[0]["h"], json!(""));
        assert_eq!(blocks[1].rows()[0]["i"], json!("j"));
        assert!(blocks[0].start_offset() < blocks[1].start_offset());
    }
}
