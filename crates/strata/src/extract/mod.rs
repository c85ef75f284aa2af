//! Heuristic fragment extraction from raw text.
//!
//! Extraction runs a set of independent classifiers over the same input.
//! Each classifier returns its own fragments; none of them share state, and
//! fragments from different classifiers may overlap in the source text.
//! A candidate that fails to parse is dropped and the scan continues, so
//! extraction as a whole never fails.
//!
//! # Example
//!
//! ```
//! use strata::extract::extract;
//!
//! let extraction = extract("a,b,c\n1,2,3\nname: bob\n{\"x\":1}");
//!
//! assert_eq!(extraction.csv_blocks.len(), 1);
//! assert_eq!(extraction.kv_blocks.len(), 1);
//! assert_eq!(extraction.json_blocks.len(), 1);
//! assert_eq!(extraction.text_block.as_text(), Some("a,b,c\n1,2,3\nname: bob\n{\"x\":1}"));
//! ```

mod html;
mod json;
mod kv;
mod tabular;

use serde::{Deserialize, Serialize};

use crate::fragment::{Fragment, FragmentKind};

pub use html::extract_html_tables;
pub use json::extract_json_blocks;
pub use kv::extract_kv_blocks;
pub use tabular::extract_csv_blocks;

/// Every fragment carved out of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub json_blocks: Vec<Fragment>,
    pub csv_blocks: Vec<Fragment>,
    pub kv_blocks: Vec<Fragment>,
    pub html_blocks: Vec<Fragment>,
    /// The whole trimmed input, always present.
    pub text_block: Fragment,
}

/// Number of fragments of each kind in an [`Extraction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentCounts {
    pub json_blocks: usize,
    pub csv_blocks: usize,
    pub kv_blocks: usize,
    pub html_tables: usize,
    pub text_block: bool,
}

impl Extraction {
    /// Fragments that carry a field schema, in kind order.
    pub fn typed(&self) -> impl Iterator<Item = &Fragment> {
        self.json_blocks
            .iter()
            .chain(&self.csv_blocks)
            .chain(&self.kv_blocks)
            .chain(&self.html_blocks)
    }

    /// Returns true when the residual text is non-empty.
    pub fn has_text(&self) -> bool {
        self.text_block.as_text().is_some_and(|t| !t.is_empty())
    }

    pub fn counts(&self) -> FragmentCounts {
        FragmentCounts {
            json_blocks: self.json_blocks.len(),
            csv_blocks: self.csv_blocks.len(),
            kv_blocks: self.kv_blocks.len(),
            html_tables: self.html_blocks.len(),
            text_block: self.has_text(),
        }
    }

    /// Fragments of a single kind.
    pub fn of_kind(&self, kind: FragmentKind) -> Vec<&Fragment> {
        match kind {
            FragmentKind::Json => self.json_blocks.iter().collect(),
            FragmentKind::Csv => self.csv_blocks.iter().collect(),
            FragmentKind::Kv => self.kv_blocks.iter().collect(),
            FragmentKind::Html => self.html_blocks.iter().collect(),
            FragmentKind::Text => vec![&self.text_block],
        }
    }
}

/// Run every classifier over `text`.
pub fn extract(text: &str) -> Extraction {
    let extraction = Extraction {
        json_blocks: extract_json_blocks(text),
        csv_blocks: extract_csv_blocks(text),
        kv_blocks: extract_kv_blocks(text),
        html_blocks: extract_html_tables(text),
        text_block: extract_text_block(text),
    };

    tracing::debug!(
        json = extraction.json_blocks.len(),
        csv = extraction.csv_blocks.len(),
        kv = extraction.kv_blocks.len(),
        html = extraction.html_blocks.len(),
        "extracted fragments"
    );

    extraction
}

/// The whole input with surrounding whitespace removed.
pub fn extract_text_block(text: &str) -> Fragment {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Fragment::text(None, "");
    }

    let leading = text.len() - text.trim_start().len();
    let offsets = CharOffsets::new(text);
    Fragment::text(
        Some(offsets.span(leading, leading + trimmed.len())),
        trimmed,
    )
}

/// Converts byte positions in a text into character positions.
///
/// ASCII text maps one to one. Other text gets a table of character start
/// positions built once, so each lookup is a binary search.
pub(crate) struct CharOffsets {
    len: usize,
    starts: Option<Vec<usize>>,
}

impl CharOffsets {
    pub(crate) fn new(text: &str) -> Self {
        let starts = (!text.is_ascii()).then(|| text.char_indices().map(|(i, _)| i).collect());
        Self {
            len: text.len(),
            starts,
        }
    }

    pub(crate) fn at(&self, byte: usize) -> usize {
        match &self.starts {
            None => byte.min(self.len),
            Some(starts) => starts.partition_point(|&start| start < byte),
        }
    }

    pub(crate) fn span(&self, start: usize, end: usize) -> (usize, usize) {
        (self.at(start), self.at(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_mixed_document() {
        let text = "a,b,c\n1,2,3\nname: bob\n{\"x\":1}";
        let extraction = extract(text);

        assert_eq!(extraction.csv_blocks.len(), 1);
        assert_eq!(extraction.csv_blocks[0].record_count(), 1);

        assert_eq!(extraction.kv_blocks.len(), 1);
        assert_eq!(
            extraction.kv_blocks[0].as_pairs(),
            json!({"name": "bob"}).as_object()
        );

        assert_eq!(extraction.json_blocks.len(), 1);
        assert_eq!(extraction.json_blocks[0].rows()[0], *json!({"x": 1}).as_object().unwrap());

        assert!(extraction.html_blocks.is_empty());
        assert_eq!(extraction.text_block.as_text(), Some(text));
    }

    #[test]
    fn test_text_block_is_trimmed_with_offsets() {
        let fragment = extract_text_block("  \n hello world \n");
        assert_eq!(fragment.as_text(), Some("hello world"));
        assert_eq!(fragment.start_offset(), Some(4));
        assert_eq!(fragment.end_offset(), Some(15));
    }

    #[test]
    fn test_empty_input_still_has_text_block() {
        let extraction = extract("   ");
        assert_eq!(extraction.text_block.as_text(), Some(""));
        assert_eq!(extraction.text_block.start_offset(), None);
        assert!(!extraction.has_text());
        assert_eq!(extraction.counts(), FragmentCounts::default());
    }

    #[test]
    fn test_char_offsets_non_ascii() {
        let text = "héllo {\"a\":1}";
        let offsets = CharOffsets::new(text);
        let brace = text.find('{').unwrap();
        assert_eq!(brace, 7);
        assert_eq!(offsets.at(brace), 6);
        assert_eq!(offsets.at(text.len()), text.chars().count());
        assert_eq!(offsets.at(2), 2);
        assert_eq!(offsets.at(text.len() + 10), text.chars().count());
    }

    #[test]
    fn test_many_objects_in_long_non_ascii_text() {
        let text = "é{\"a\":1}".repeat(20_000);
        let extraction = extract(&text);
        assert_eq!(extraction.json_blocks.len(), 20_000);

        let last = extraction.json_blocks.last().unwrap();
        assert_eq!(last.start_offset(), Some(19_999 * 8 + 1));
        assert_eq!(last.end_offset(), Some(20_000 * 8));
    }

    #[test]
    fn test_counts_and_typed() {
        let extraction = extract("k: v\n{\"a\":true}\n{\"b\":null}");
        let counts = extraction.counts();
        assert_eq!(counts.json_blocks, 2);
        assert_eq!(counts.kv_blocks, 1);
        assert!(counts.text_block);
        assert_eq!(extraction.typed().count(), 3);
        assert_eq!(extraction.of_kind(FragmentKind::Json).len(), 2);
    }
}
