//! Fuzz target for schema diff on arbitrary stored text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use strata::diff;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let text: &str = &text;
    let (old, new) = text.split_once('\u{0}').unwrap_or((text, "{}"));
    let _ = diff(old, new);
    assert!(diff(old, old).is_empty());
});
