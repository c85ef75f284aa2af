//! Storage collaborators for fragments, sampled documents, and schema versions.
//!
//! The inference engine only depends on the traits defined here. Two
//! backends are provided: [`MemoryStore`] for tests and embedding, and
//! [`DirectoryStore`], which keeps everything as JSON files under one root
//! directory.
//!
//! | Trait | Used by |
//! |-------|---------|
//! | [`FragmentStore`] | ingest (write side), inference (fragment listing) |
//! | [`DocumentSampleSource`] | inference (bounded document samples) |
//! | [`SchemaVersionStore`] | inference (append), version queries |

mod directory;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::fragment::{Fragment, FragmentKind, Record};
use crate::schema::SchemaVersion;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

/// A document persisted for a fragment.
pub type Document = Record;

/// Metadata row for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub source_id: Option<String>,
    pub filename: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    /// `sha256:<hex>` digest of the raw bytes.
    pub content_hash: String,
    pub raw_text_excerpt: String,
    pub created_at: DateTime<Utc>,
}

/// Lightweight metadata row describing one stored fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDescriptor {
    pub id: String,
    pub file_id: String,
    pub kind: FragmentKind,
    pub start_offset: Option<usize>,
    pub end_offset: Option<usize>,
    pub record_count: usize,
    pub preview: Value,
}

impl FragmentDescriptor {
    /// Describe a fragment with a freshly assigned id.
    pub fn describe(
        file_id: impl Into<String>,
        fragment: &Fragment,
        preview_rows: usize,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_id: file_id.into(),
            kind: fragment.kind(),
            start_offset: fragment.start_offset(),
            end_offset: fragment.end_offset(),
            record_count: fragment.record_count(),
            preview: fragment.preview(preview_rows, excerpt_chars),
        }
    }
}

/// A source and how many uploaded files contributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source_id: String,
    pub file_count: usize,
}

/// Write and query side of the fragment metadata store.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Record an uploaded file.
    async fn record_file(&self, file: &UploadedFile) -> Result<()>;

    /// Store a fragment descriptor together with its documents.
    async fn save_fragment(
        &self,
        descriptor: &FragmentDescriptor,
        documents: Vec<Document>,
    ) -> Result<()>;

    async fn get_file(&self, file_id: &str) -> Result<Option<UploadedFile>>;

    /// Files ordered newest first.
    async fn list_files(&self, limit: usize, offset: usize) -> Result<Vec<UploadedFile>>;

    /// Fragments of one file ordered by kind, then id.
    async fn fragments_for_file(
        &self,
        file_id: &str,
        kind: Option<FragmentKind>,
    ) -> Result<Vec<FragmentDescriptor>>;

    /// Fragments of every file belonging to a source.
    async fn fragments_for_source(&self, source_id: &str) -> Result<Vec<FragmentDescriptor>>;

    /// Sources with at least one file, ordered by source id.
    async fn list_sources(&self) -> Result<Vec<SourceSummary>>;
}

/// Read side of the document store.
#[async_trait]
pub trait DocumentSampleSource: Send + Sync {
    /// Up to `limit` documents stored for a fragment, in no particular order.
    async fn sample(
        &self,
        fragment_id: &str,
        kind: FragmentKind,
        limit: usize,
    ) -> Result<Vec<Document>>;
}

/// Append-only store of schema versions.
#[async_trait]
pub trait SchemaVersionStore: Send + Sync {
    /// Highest version stored for a source.
    async fn latest(&self, source_id: &str) -> Result<Option<SchemaVersion>>;

    /// Store a fully built version.
    ///
    /// Fails with [`StrataError::VersionConflict`](crate::StrataError::VersionConflict)
    /// if the `(source_id, version)` pair already exists. A version is never
    /// visible before it is completely written.
    async fn append(&self, version: SchemaVersion) -> Result<SchemaVersion>;

    async fn get(&self, source_id: &str, version: u32) -> Result<Option<SchemaVersion>>;

    /// All versions of a source, ascending.
    async fn list(&self, source_id: &str) -> Result<Vec<SchemaVersion>>;
}
