//! Core type definitions for extracted fragments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single structured record: field name to JSON value, in source order.
pub type Record = serde_json::Map<String, Value>;

/// Structural kind of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// A brace-delimited JSON object.
    Json,
    /// A run of comma-separated lines with a header.
    Csv,
    /// `key: value` pairs merged across the document.
    Kv,
    /// An HTML `<table>`.
    Html,
    /// The trimmed residual text.
    Text,
}

impl FragmentKind {
    /// All kinds, in extraction order.
    pub const ALL: [FragmentKind; 5] = [
        FragmentKind::Json,
        FragmentKind::Csv,
        FragmentKind::Kv,
        FragmentKind::Html,
        FragmentKind::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Json => "json",
            FragmentKind::Csv => "csv",
            FragmentKind::Kv => "kv",
            FragmentKind::Html => "html",
            FragmentKind::Text => "text",
        }
    }

    /// Returns true if fragments of this kind carry a field schema.
    ///
    /// Free text has no fields and is skipped by inference.
    pub fn has_schema(&self) -> bool {
        !matches!(self, FragmentKind::Text)
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(FragmentKind::Json),
            "csv" => Ok(FragmentKind::Csv),
            "kv" => Ok(FragmentKind::Kv),
            "html" => Ok(FragmentKind::Html),
            "text" => Ok(FragmentKind::Text),
            _ => Err(format!(
                "Unknown fragment kind: {}. Use json, csv, kv, html, or text.",
                s
            )),
        }
    }
}

/// Structured content carried by a fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// One mapping per logical record (json, csv, html).
    Records(Vec<Record>),
    /// A single merged mapping (kv).
    Pairs(Record),
    /// Raw text.
    Text(String),
}

/// A typed, offset-tagged chunk of content extracted from one document.
///
/// Offsets are character positions in the source text. Fragments are built
/// once by the extractor and never mutated, so the record count always
/// agrees with the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    kind: FragmentKind,
    start_offset: Option<usize>,
    end_offset: Option<usize>,
    record_count: usize,
    payload: Payload,
}

impl Fragment {
    /// Build a record-sequence fragment.
    pub fn records(
        kind: FragmentKind,
        span: Option<(usize, usize)>,
        records: Vec<Record>,
    ) -> Self {
        Self {
            kind,
            start_offset: span.map(|(s, _)| s),
            end_offset: span.map(|(_, e)| e),
            record_count: records.len(),
            payload: Payload::Records(records),
        }
    }

    /// Build a key-value fragment from a merged mapping.
    pub fn pairs(span: Option<(usize, usize)>, pairs: Record) -> Self {
        Self {
            kind: FragmentKind::Kv,
            start_offset: span.map(|(s, _)| s),
            end_offset: span.map(|(_, e)| e),
            record_count: pairs.len(),
            payload: Payload::Pairs(pairs),
        }
    }

    /// Build the residual text fragment.
    pub fn text(span: Option<(usize, usize)>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: FragmentKind::Text,
            start_offset: span.map(|(s, _)| s),
            end_offset: span.map(|(_, e)| e),
            record_count: usize::from(!text.is_empty()),
            payload: Payload::Text(text),
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn start_offset(&self) -> Option<usize> {
        self.start_offset
    }

    pub fn end_offset(&self) -> Option<usize> {
        self.end_offset
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The records of a record-sequence fragment; empty for other shapes.
    pub fn rows(&self) -> &[Record] {
        match &self.payload {
            Payload::Records(records) => records,
            _ => &[],
        }
    }

    /// The merged mapping of a key-value fragment.
    pub fn as_pairs(&self) -> Option<&Record> {
        match &self.payload {
            Payload::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// The content of a text fragment.
    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Documents to persist in the document store for this fragment.
    ///
    /// One document per record, the merged mapping for key-value fragments,
    /// and nothing for text.
    pub fn documents(&self) -> Vec<Record> {
        match &self.payload {
            Payload::Records(records) => records.clone(),
            Payload::Pairs(pairs) => vec![pairs.clone()],
            Payload::Text(_) => Vec::new(),
        }
    }

    /// A small preview suitable for a metadata row.
    pub fn preview(&self, rows: usize, chars: usize) -> Value {
        match &self.payload {
            Payload::Records(records) => Value::Array(
                records
                    .iter()
                    .take(rows)
                    .cloned()
                    .map(Value::Object)
                    .collect(),
            ),
            Payload::Pairs(pairs) => Value::Object(pairs.clone()),
            Payload::Text(text) => Value::String(text.chars().take(chars).collect()),
        }
    }
}
