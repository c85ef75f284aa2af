//! Field type-set accumulation.

use std::collections::{BTreeMap, BTreeSet};

use crate::fragment::Record;
use crate::schema::{FieldTypes, SchemaField, TypeTag};

/// Field name to the set of tags seen for it.
///
/// Merging is set union per field, which is commutative and associative with
/// [`TypeAccumulator::default`] as identity. Partial accumulators built from
/// different fragments can therefore be merged in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAccumulator {
    fields: BTreeMap<String, BTreeSet<TypeTag>>,
}

impl TypeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate the types of one document, skipping `identity_field`.
    pub fn observe(mut self, document: &Record, identity_field: &str) -> Self {
        for (key, value) in document {
            if key == identity_field {
                continue;
            }
            self.fields
                .entry(key.clone())
                .or_default()
                .insert(TypeTag::of(value));
        }
        self
    }

    /// Build an accumulator from a batch of documents.
    pub fn from_documents<'a>(
        documents: impl IntoIterator<Item = &'a Record>,
        identity_field: &str,
    ) -> Self {
        documents
            .into_iter()
            .fold(Self::new(), |acc, doc| acc.observe(doc, identity_field))
    }

    /// Union of two accumulators.
    pub fn merge(mut self, other: Self) -> Self {
        for (field, tags) in other.fields {
            self.fields.entry(field).or_default().extend(tags);
        }
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Freeze into a field map with lexically ordered type lists.
    pub fn finish(self) -> FieldTypes {
        self.fields
            .into_iter()
            .map(|(field, tags)| (field, SchemaField::new(tags)))
            .collect()
    }
}
