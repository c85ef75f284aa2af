//! Comma-separated block detection.

use serde_json::Value;

use super::CharOffsets;
use crate::fragment::{Fragment, FragmentKind, Record};

/// A line's content and its byte range in the source text.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    content: &'a str,
    start: usize,
    end: usize,
}

/// Returns true if a line looks like a table row rather than a `key: value` line.
fn is_candidate_row(line: &str) -> bool {
    line.contains(',') && !line.contains(':')
}

/// Split text into lines, keeping byte positions and dropping line terminators.
fn lines_with_positions(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut start = 0;
    text.split_inclusive('\n').map(move |raw| {
        let content = raw
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(raw);
        let line = Line {
            content,
            start,
            end: start + content.len(),
        };
        start += raw.len();
        line
    })
}

/// Find runs of comma-bearing lines and parse each run as a headed table.
///
/// A run must span at least two lines (header plus one row). Lines
/// containing a colon break a run, since they read as key-value pairs.
/// A run whose quoting joins lines together is discarded: every line must
/// parse to exactly one record.
pub fn extract_csv_blocks(text: &str) -> Vec<Fragment> {
    let offsets = CharOffsets::new(text);
    let mut blocks = Vec::new();
    let mut current: Vec<Line<'_>> = Vec::new();

    for line in lines_with_positions(text) {
        if is_candidate_row(line.content) {
            current.push(line);
            continue;
        }
        flush_block(&offsets, &mut current, &mut blocks);
    }
    flush_block(&offsets, &mut current, &mut blocks);

    blocks
}

fn flush_block(
    offsets: &CharOffsets,
    current: &mut Vec<Line<'_>>,
    blocks: &mut Vec<Fragment>,
) {
    if current.len() > 1 {
        let start = current[0].start;
        let end = current[current.len() - 1].end;
        let block = current
            .iter()
            .map(|l| l.content)
            .collect::<Vec<_>>()
            .join("\n");

        let expected = current.len() - 1;
        match parse_block(&block) {
            Ok(rows) if rows.len() != expected => {
                tracing::debug!(
                    offset = start,
                    expected,
                    parsed = rows.len(),
                    "discarding CSV block with unbalanced quoting"
                );
            }
            Ok(rows) => blocks.push(Fragment::records(
                FragmentKind::Csv,
                Some(offsets.span(start, end)),
                rows,
            )),
            Err(e) => {
                tracing::debug!(offset = start, error = %e, "discarding CSV block");
            }
        }
    }
    current.clear();
}

/// Parse a block using its first line as the header.
///
/// Short rows map the missing columns to null; extra cells beyond the header
/// are dropped.
fn parse_block(block: &str) -> Result<Vec<Record>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(block.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = Record::new();
        for (index, header) in headers.iter().enumerate() {
            let value = record
                .get(index)
                .map(|cell| Value::String(cell.to_string()))
                .unwrap_or(Value::Null);
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}
