//! Main Strata struct and public API.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::diff::{SchemaDiff, diff_fields};
use crate::error::{Result, StrataError};
use crate::extract::{Extraction, extract};
use crate::fragment::FragmentKind;
use crate::inference::{InferenceConfig, SchemaInferenceEngine};
use crate::ingest::{IngestConfig, IngestReport, Ingestor};
use crate::schema::SchemaVersion;
use crate::store::{
    DirectoryStore, DocumentSampleSource, FragmentDescriptor, FragmentStore, MemoryStore,
    SchemaVersionStore, SourceSummary, UploadedFile,
};

/// Largest page size accepted by [`Strata::list_files`].
pub const MAX_FILE_PAGE: usize = 500;

/// Configuration for a [`Strata`] instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Schema inference configuration.
    pub inference: InferenceConfig,
    /// Upload preview configuration.
    pub ingest: IngestConfig,
}

impl StrataConfig {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| StrataError::io(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| StrataError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Extraction, ingestion, inference and schema queries over one set of stores.
pub struct Strata {
    fragments: Arc<dyn FragmentStore>,
    versions: Arc<dyn SchemaVersionStore>,
    ingestor: Ingestor,
    inference: SchemaInferenceEngine,
}

impl Strata {
    /// Create an instance over the given stores with default configuration.
    pub fn new(
        fragments: Arc<dyn FragmentStore>,
        documents: Arc<dyn DocumentSampleSource>,
        versions: Arc<dyn SchemaVersionStore>,
    ) -> Self {
        Self::with_config(StrataConfig::default(), fragments, documents, versions)
    }

    /// Create an instance over the given stores with custom configuration.
    pub fn with_config(
        config: StrataConfig,
        fragments: Arc<dyn FragmentStore>,
        documents: Arc<dyn DocumentSampleSource>,
        versions: Arc<dyn SchemaVersionStore>,
    ) -> Self {
        let ingestor = Ingestor::with_config(config.ingest, fragments.clone());
        let inference = SchemaInferenceEngine::with_config(
            config.inference,
            fragments.clone(),
            documents,
            versions.clone(),
        );

        Self {
            fragments,
            versions,
            ingestor,
            inference,
        }
    }

    /// Create an instance backed by a fresh [`MemoryStore`].
    pub fn in_memory(config: StrataConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_config(config, store.clone(), store.clone(), store)
    }

    /// Open an instance backed by a [`DirectoryStore`] at `root`.
    pub async fn open(root: impl AsRef<Path>, config: StrataConfig) -> Result<Self> {
        let store = Arc::new(DirectoryStore::open(root).await?);
        Ok(Self::with_config(config, store.clone(), store.clone(), store))
    }

    /// Extract fragments from text without storing anything.
    pub fn extract(&self, text: &str) -> Extraction {
        extract(text)
    }

    /// Store an uploaded file and its fragments.
    pub async fn ingest(
        &self,
        source_id: Option<&str>,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<IngestReport> {
        self.ingestor
            .ingest(source_id, filename, content_type, bytes)
            .await
    }

    /// Infer and store the next schema version for a source.
    pub async fn infer_schema(&self, source_id: &str) -> Result<SchemaVersion> {
        self.inference.infer_schema(source_id).await
    }

    pub async fn latest_schema(&self, source_id: &str) -> Result<Option<SchemaVersion>> {
        self.versions.latest(source_id).await
    }

    /// Every stored version of a source, ascending.
    pub async fn list_versions(&self, source_id: &str) -> Result<Vec<SchemaVersion>> {
        self.versions.list(source_id).await
    }

    /// Diff two stored versions of a source.
    pub async fn compare_versions(&self, source_id: &str, v1: u32, v2: u32) -> Result<SchemaDiff> {
        let old = self.version(source_id, v1).await?;
        let new = self.version(source_id, v2).await?;
        Ok(diff_fields(&old.schema, &new.schema))
    }

    /// Uploaded files, newest first. `limit` is clamped to `1..=500`.
    pub async fn list_files(&self, limit: usize, offset: usize) -> Result<Vec<UploadedFile>> {
        self.fragments
            .list_files(limit.clamp(1, MAX_FILE_PAGE), offset)
            .await
    }

    /// Fragments stored for a file, optionally of one kind.
    pub async fn fragments_for_file(
        &self,
        file_id: &str,
        kind: Option<FragmentKind>,
    ) -> Result<Vec<FragmentDescriptor>> {
        if self.fragments.get_file(file_id).await?.is_none() {
            return Err(StrataError::FileNotFound(file_id.to_string()));
        }
        self.fragments.fragments_for_file(file_id, kind).await
    }

    pub async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        self.fragments.list_sources().await
    }

    async fn version(&self, source_id: &str, version: u32) -> Result<SchemaVersion> {
        self.versions
            .get(source_id, version)
            .await?
            .ok_or_else(|| StrataError::VersionNotFound {
                source_id: source_id.to_string(),
                version,
            })
    }
}
