//! Brace-delimited JSON object detection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::CharOffsets;
use crate::fragment::{Fragment, FragmentKind};

// Shortest run from an opening brace to the next closing brace. Nested
// objects are cut at the first inner `}` and fail to parse; that lenient
// behavior is kept so extraction counts stay stable for existing callers.
static JSON_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*?\}").expect("valid JSON candidate pattern"));

/// Find every brace-bounded substring that parses as a JSON object.
///
/// Arrays and scalars are rejected; each accepted object becomes its own
/// fragment holding a single record.
pub fn extract_json_blocks(text: &str) -> Vec<Fragment> {
    let offsets = CharOffsets::new(text);

    JSON_CANDIDATE
        .find_iter(text)
        .filter_map(|candidate| match serde_json::from_str::<Value>(candidate.as_str()) {
            Ok(Value::Object(object)) => Some(Fragment::records(
                FragmentKind::Json,
                Some(offsets.span(candidate.start(), candidate.end())),
                vec![object],
            )),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(
                    offset = candidate.start(),
                    error = %e,
                    "discarding JSON candidate"
                );
                None
            }
        })
        .collect()
}
