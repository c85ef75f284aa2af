//! Property-based tests for extraction, inference and diff.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p strata --test property_tests
//!
//! # Run with more cases
//! PROPTEST_CASES=10000 cargo test -p strata --test property_tests
//! ```

use proptest::prelude::*;
use serde_json::Value;

use strata::extract::{extract, extract_csv_blocks, extract_html_tables, extract_kv_blocks};
use strata::{FieldTypes, Record, SchemaField, TypeAccumulator, TypeTag, diff, diff_fields};

// =============================================================================
// Test Strategies
// =============================================================================

/// Text biased towards the characters the classifiers look for.
fn structured_noise() -> impl Strategy<Value = String> {
    "[a-z0-9 ,:{}\"<>/\\[\\]\n\t\r]{0,300}"
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![structured_noise(), "\\PC{0,200}", any::<String>()]
}

/// A header plus data rows of quote-free, colon-free cells.
fn csv_table() -> impl Strategy<Value = (usize, String)> {
    (2usize..6, 1usize..20).prop_flat_map(|(cols, rows)| {
        proptest::collection::vec(
            proptest::collection::vec("[a-z0-9]{1,6}", cols),
            rows + 1,
        )
        .prop_map(move |lines| {
            let text = lines
                .iter()
                .map(|cells| cells.join(","))
                .collect::<Vec<_>>()
                .join("\n");
            (rows, text)
        })
    })
}

fn type_tag() -> impl Strategy<Value = TypeTag> {
    prop_oneof![
        Just(TypeTag::Array),
        Just(TypeTag::Boolean),
        Just(TypeTag::Null),
        Just(TypeTag::Number),
        Just(TypeTag::Object),
        Just(TypeTag::String),
    ]
}

fn field_types() -> impl Strategy<Value = FieldTypes> {
    proptest::collection::btree_map(
        "[a-z_]{1,8}",
        proptest::collection::btree_set(type_tag(), 1..4),
        0..8,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .map(|(name, tags)| (name, SchemaField::new(tags)))
            .collect()
    })
}

fn json_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z]{0,5}".prop_map(Value::String),
        Just(Value::Array(Vec::new())),
        Just(Value::Object(Record::new())),
    ]
}

fn document() -> impl Strategy<Value = Record> {
    proptest::collection::btree_map("[a-d_]{1,3}", json_value(), 0..5)
        .prop_map(|fields| fields.into_iter().collect())
}

// =============================================================================
// Extraction Properties
// =============================================================================

proptest! {
    /// Extraction never panics and the residual text is the trimmed input.
    #[test]
    fn residual_text_is_trimmed_input(input in any_text()) {
        let extraction = extract(&input);
        prop_assert_eq!(extraction.text_block.as_text(), Some(input.trim()));
    }

    /// Every accepted JSON block re-parses as an object from its source span.
    #[test]
    fn json_blocks_reparse_from_span(input in structured_noise()) {
        let extraction = extract(&input);
        for block in &extraction.json_blocks {
            let (start, end) = (
                block.start_offset().unwrap(),
                block.end_offset().unwrap(),
            );
            let slice: String = input.chars().skip(start).take(end - start).collect();
            let parsed: Value = serde_json::from_str(&slice).unwrap();
            prop_assert!(parsed.is_object());
            prop_assert_eq!(parsed.as_object(), Some(&block.rows()[0]));
        }
    }

    /// A clean comma table yields one block with one record per data line.
    #[test]
    fn csv_record_count_matches_data_lines((rows, text) in csv_table()) {
        let blocks = extract_csv_blocks(&text);
        prop_assert_eq!(blocks.len(), 1);
        prop_assert_eq!(blocks[0].record_count(), rows);
        prop_assert_eq!(blocks[0].rows().len(), rows);
    }

    /// Key-value extraction is deterministic.
    #[test]
    fn kv_extraction_is_idempotent(input in structured_noise()) {
        prop_assert_eq!(extract_kv_blocks(&input), extract_kv_blocks(&input));
    }

    /// A data row two cells shorter than the header keeps only the paired keys.
    #[test]
    fn html_short_rows_truncate(width in 3usize..8) {
        let header: String = (0..width).map(|i| format!("<th>h{}</th>", i)).collect();
        let row: String = (0..width - 2).map(|i| format!("<td>v{}</td>", i)).collect();
        let html = format!("<table><tr>{}</tr><tr>{}</tr></table>", header, row);

        let tables = extract_html_tables(&html);
        prop_assert_eq!(tables.len(), 1);
        prop_assert_eq!(tables[0].rows()[0].len(), width - 2);
    }
}

// =============================================================================
// Inference and Diff Properties
// =============================================================================

proptest! {
    /// Merging partial accumulators gives the same schema in any order.
    #[test]
    fn accumulator_merge_is_order_independent(
        a in proptest::collection::vec(document(), 0..6),
        b in proptest::collection::vec(document(), 0..6),
    ) {
        let left = TypeAccumulator::from_documents(&a, "_id");
        let right = TypeAccumulator::from_documents(&b, "_id");
        let combined: Vec<Record> = a.iter().chain(&b).cloned().collect();

        let forward = left.clone().merge(right.clone()).finish();
        let backward = right.merge(left).finish();
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward, TypeAccumulator::from_documents(&combined, "_id").finish());
    }

    /// A schema compared with itself has no drift.
    #[test]
    fn diff_with_itself_is_empty(schema in field_types()) {
        prop_assert!(diff_fields(&schema, &schema).is_empty());

        let json = schema.to_json_string().unwrap();
        prop_assert!(diff(&json, &json).is_empty());
    }

    /// Swapping sides swaps added and removed fields.
    #[test]
    fn diff_is_antisymmetric(old in field_types(), new in field_types()) {
        let forward = diff_fields(&old, &new);
        let backward = diff_fields(&new, &old);
        prop_assert_eq!(&forward.added_fields, &backward.removed_fields);
        prop_assert_eq!(&forward.removed_fields, &backward.added_fields);
        prop_assert_eq!(
            forward.changed_fields.keys().collect::<Vec<_>>(),
            backward.changed_fields.keys().collect::<Vec<_>>()
        );
    }

    /// Diff never panics on arbitrary stored text.
    #[test]
    fn diff_tolerates_garbage(old in any_text(), new in any_text()) {
        let _ = diff(&old, &new);
    }
}
