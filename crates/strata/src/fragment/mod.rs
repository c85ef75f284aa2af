//! Fragment types produced by extraction.

mod types;

pub use types::{Fragment, FragmentKind, Payload, Record};
