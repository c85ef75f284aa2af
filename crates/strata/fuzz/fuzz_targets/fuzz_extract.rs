//! Fuzz target for fragment extraction.
//!
//! Extraction must never panic, and the residual text must always be the
//! trimmed input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use strata::extract::extract;
use strata::ingest::decode_text;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let text = decode_text(data);
    let extraction = extract(&text);
    assert_eq!(extraction.text_block.as_text(), Some(text.trim()));
});
