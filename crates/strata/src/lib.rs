//! Strata: fragment extraction and schema drift tracking for unstructured documents.
//!
//! Strata carves structured fragments (JSON objects, comma-separated tables,
//! `key: value` pairs, HTML tables) out of raw text, infers a per-source field
//! schema from the stored fragments, and reports how that schema changes from
//! one version to the next.
//!
//! # Core Principles
//!
//! - **Heuristic, never fatal**: a candidate that fails to parse is skipped
//! - **Append-only history**: every inference run stores a new numbered version
//! - **Pluggable storage**: the engines only see the traits in [`store`]
//!
//! # Example
//!
//! ```
//! use strata::{Strata, StrataConfig};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let strata = Strata::in_memory(StrataConfig::default());
//!     strata
//!         .ingest(Some("crm"), "a.txt", None, b"{\"x\": 1, \"y\": \"a\"}")
//!         .await
//!         .unwrap();
//!     strata.infer_schema("crm").await.unwrap();
//!
//!     strata
//!         .ingest(Some("crm"), "b.txt", None, b"{\"x\": \"1\"}")
//!         .await
//!         .unwrap();
//!     strata.infer_schema("crm").await.unwrap();
//!
//!     let drift = strata.compare_versions("crm", 1, 2).await.unwrap();
//!     assert!(drift.changed_fields.contains_key("x"));
//! });
//! ```

pub mod diff;
pub mod error;
pub mod extract;
pub mod fragment;
pub mod inference;
pub mod ingest;
pub mod schema;
pub mod store;

mod strata;

pub use crate::strata::{MAX_FILE_PAGE, Strata, StrataConfig};
pub use diff::{FieldChange, SchemaDiff, diff, diff_fields};
pub use error::{Result, StrataError};
pub use extract::{Extraction, FragmentCounts, extract};
pub use fragment::{Fragment, FragmentKind, Payload, Record};
pub use inference::{InferenceConfig, SchemaInferenceEngine, TypeAccumulator};
pub use ingest::{IngestConfig, IngestReport, Ingestor};
pub use schema::{FieldTypes, SchemaField, SchemaVersion, TypeTag};
pub use store::{
    DirectoryStore, DocumentSampleSource, FragmentDescriptor, FragmentStore, MemoryStore,
    SchemaVersionStore, SourceSummary, UploadedFile,
};
