//! Schema drift between two schema snapshots.
//!
//! The comparison is a pure function of the two field maps. The caller
//! decides which side is "old" and which is "new"; nothing here checks
//! version order.
//!
//! # Example
//!
//! ```
//! use strata::diff::diff;
//!
//! let v1 = r#"{"age":{"types":["number"]},"name":{"types":["string"]}}"#;
//! let v2 = r#"{"age":{"types":["number","string"]},"email":{"types":["string"]}}"#;
//! let report = diff(v1, v2);
//!
//! assert_eq!(report.added_fields, vec!["email"]);
//! assert_eq!(report.removed_fields, vec!["name"]);
//! assert_eq!(report.changed_fields["age"].new_types, vec!["number", "string"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::FieldTypes;

/// Old and new type lists for a field present on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old_types: Vec<String>,
    pub new_types: Vec<String>,
}

/// Fields added, removed, or retyped between two schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// In the newer schema only, ascending.
    pub added_fields: Vec<String>,
    /// In the older schema only, ascending.
    pub removed_fields: Vec<String>,
    /// In both schemas with different type lists.
    pub changed_fields: BTreeMap<String, FieldChange>,
}

impl SchemaDiff {
    /// Returns true when the two schemas are equivalent.
    pub fn is_empty(&self) -> bool {
        self.added_fields.is_empty()
            && self.removed_fields.is_empty()
            && self.changed_fields.is_empty()
    }
}

/// Compare two schemas in their stored JSON form.
///
/// Text that is not a JSON object counts as a schema with no fields, so the
/// comparison degrades to "everything added" or "everything removed" rather
/// than failing.
pub fn diff(old_json: &str, new_json: &str) -> SchemaDiff {
    compare(&parse_lenient(old_json), &parse_lenient(new_json))
}

/// Compare two typed field maps.
pub fn diff_fields(old: &FieldTypes, new: &FieldTypes) -> SchemaDiff {
    compare(&type_lists(old), &type_lists(new))
}

fn type_lists(fields: &FieldTypes) -> BTreeMap<String, Vec<String>> {
    fields
        .iter()
        .map(|(name, field)| (name.to_string(), field.type_names()))
        .collect()
}

/// Read a stored schema without failing.
///
/// A field whose entry lacks a `types` list is treated as having no types;
/// non-string entries inside `types` are ignored.
fn parse_lenient(json: &str) -> BTreeMap<String, Vec<String>> {
    let object = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            tracing::warn!("stored schema is not a JSON object; treating as empty");
            return BTreeMap::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored schema is not valid JSON; treating as empty");
            return BTreeMap::new();
        }
    };

    object
        .into_iter()
        .map(|(name, entry)| {
            let types = entry
                .get("types")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            (name, types)
        })
        .collect()
}

fn compare(
    old: &BTreeMap<String, Vec<String>>,
    new: &BTreeMap<String, Vec<String>>,
) -> SchemaDiff {
    let old_names: BTreeSet<&String> = old.keys().collect();
    let new_names: BTreeSet<&String> = new.keys().collect();

    let added_fields = new_names
        .difference(&old_names)
        .map(|s| s.to_string())
        .collect();
    let removed_fields = old_names
        .difference(&new_names)
        .map(|s| s.to_string())
        .collect();

    let changed_fields = old_names
        .intersection(&new_names)
        .filter_map(|name| {
            let mut old_types = old[*name].clone();
            let mut new_types = new[*name].clone();
            old_types.sort();
            new_types.sort();
            (old_types != new_types).then(|| {
                (
                    name.to_string(),
                    FieldChange {
                        old_types,
                        new_types,
                    },
                )
            })
        })
        .collect();

    SchemaDiff {
        added_fields,
        removed_fields,
        changed_fields,
    }
}
