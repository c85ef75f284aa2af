//! `key: value` pair detection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::CharOffsets;
use crate::fragment::{Fragment, Record};

static KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9_ ]+):\s*([^\n]+)").expect("valid key-value pattern")
});

/// Merge every `key: value` pair in the text into one fragment.
///
/// Keys and values are trimmed. A key seen more than once keeps its first
/// position but takes the value of its last occurrence. Returns no fragment
/// when the text has no pairs.
pub fn extract_kv_blocks(text: &str) -> Vec<Fragment> {
    let mut pairs = Record::new();
    let mut span: Option<(usize, usize)> = None;

    for caps in KEY_VALUE.captures_iter(text) {
        let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        span = Some(match span {
            Some((start, _)) => (start, whole.end()),
            None => (whole.start(), whole.end()),
        });
        pairs.insert(
            key.as_str().trim().to_string(),
            Value::String(value.as_str().trim().to_string()),
        );
    }

    if pairs.is_empty() {
        return Vec::new();
    }

    let offsets = CharOffsets::new(text);
    vec![Fragment::pairs(
        span.map(|(start, end)| offsets.span(start, end)),
        pairs,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_are_merged() {
        let blocks = extract_kv_blocks("Name: Alice\nAccount ID: 42\n\nnotes without pairs");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].record_count(), 2);
        let pairs = blocks[0].as_pairs().unwrap();
        assert_eq!(pairs["Name"], json!("Alice"));
        assert_eq!(pairs["Account ID"], json!("42"));
        assert_eq!(blocks[0].start_offset(), Some(0));
        assert_eq!(blocks[0].end_offset(), Some(26));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let blocks = extract_kv_blocks("status: draft\nowner: kim\nstatus: final");
        let pairs = blocks[0].as_pairs().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["status"], json!("final"));
        assert_eq!(pairs.keys().next().map(String::as_str), Some("status"));
    }

    #[test]
    fn test_no_pairs() {
        assert!(extract_kv_blocks("just prose, no pairs").is_empty());
        assert!(extract_kv_blocks("").is_empty());
    }

    #[test]
    fn test_quoted_json_keys_do_not_match() {
        assert!(extract_kv_blocks("{\"x\":1}").is_empty());
    }

    #[test]
    fn test_idempotent() {
        let text = "a: 1\nb: 2\na: 3";
        assert_eq!(extract_kv_blocks(text), extract_kv_blocks(text));
    }
}
