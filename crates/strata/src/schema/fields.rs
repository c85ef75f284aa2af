//! Field name to type-set mapping.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::types::TypeTag;

/// The set of type tags observed for one field.
///
/// Serialized as `{"types": [...]}` with tags in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub types: BTreeSet<TypeTag>,
}

impl SchemaField {
    pub fn new(types: impl IntoIterator<Item = TypeTag>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    /// Tag names in lexical order.
    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.as_str().to_string()).collect()
    }
}

/// Field name to observed type set, ordered by field name.
///
/// This is the stored form of a schema:
/// `{"<field>": {"types": ["boolean", "number"]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTypes(BTreeMap<String, SchemaField>);

impl FieldTypes {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, field: &str) -> Option<&SchemaField> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in ascending order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize to the stored JSON form.
    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the stored JSON form.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<(String, SchemaField)> for FieldTypes {
    fn from_iter<I: IntoIterator<Item = (String, SchemaField)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FieldTypes {
    type Item = (&'a String, &'a SchemaField);
    type IntoIter = std::collections::btree_map::Iter<'a, String, SchemaField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
