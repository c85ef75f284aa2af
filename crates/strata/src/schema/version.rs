//! Immutable, numbered schema snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::FieldTypes;

/// One inferred schema for a source.
///
/// Versions start at 1 and increase by one per inference run. A stored
/// version is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub source_id: String,
    pub version: u32,
    pub schema: FieldTypes,
    pub created_at: DateTime<Utc>,
}

impl SchemaVersion {
    /// Create the version that follows `previous`, or version 1.
    pub fn next(
        source_id: impl Into<String>,
        previous: Option<&SchemaVersion>,
        schema: FieldTypes,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            version: previous.map_or(1, |p| p.version + 1),
            schema,
            created_at: Utc::now(),
        }
    }

    /// The schema in its stored JSON form.
    pub fn schema_json(&self) -> crate::Result<String> {
        self.schema.to_json_string()
    }
}
