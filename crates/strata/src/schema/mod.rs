//! Schema types: primitive type tags, field maps, and versioned snapshots.

mod fields;
mod types;
mod version;

pub use fields::{FieldTypes, SchemaField};
pub use types::TypeTag;
pub use version::SchemaVersion;
