//! Schema inference over sampled fragment documents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{Result, StrataError};
use crate::schema::{FieldTypes, SchemaVersion};
use crate::store::{DocumentSampleSource, FragmentStore, SchemaVersionStore};

use super::accumulator::TypeAccumulator;

/// Inference configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Maximum documents sampled per fragment.
    pub sample_limit: usize,
    /// Storage-assigned field removed from every sampled document.
    pub identity_field: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_limit: 50,
            identity_field: "_id".to_string(),
        }
    }
}

/// Builds new schema versions for a source from its stored fragments.
///
/// Runs for the same source are serialized inside one engine, so each run
/// reads the latest version and appends the next one without interleaving.
/// Across processes the version store's uniqueness check reports a lost race
/// as [`StrataError::VersionConflict`].
pub struct SchemaInferenceEngine {
    config: InferenceConfig,
    fragments: Arc<dyn FragmentStore>,
    documents: Arc<dyn DocumentSampleSource>,
    versions: Arc<dyn SchemaVersionStore>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SchemaInferenceEngine {
    /// Create an engine with default configuration.
    pub fn new(
        fragments: Arc<dyn FragmentStore>,
        documents: Arc<dyn DocumentSampleSource>,
        versions: Arc<dyn SchemaVersionStore>,
    ) -> Self {
        Self::with_config(InferenceConfig::default(), fragments, documents, versions)
    }

    /// Create an engine with custom configuration.
    pub fn with_config(
        config: InferenceConfig,
        fragments: Arc<dyn FragmentStore>,
        documents: Arc<dyn DocumentSampleSource>,
        versions: Arc<dyn SchemaVersionStore>,
    ) -> Self {
        Self {
            config,
            fragments,
            documents,
            versions,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer the field map for a source without storing it.
    ///
    /// Fails with [`StrataError::NoData`] when the source has no fragments.
    /// Any failed document read fails the whole call.
    pub async fn infer_fields(&self, source_id: &str) -> Result<FieldTypes> {
        let fragments = self.fragments.fragments_for_source(source_id).await?;
        if fragments.is_empty() {
            return Err(StrataError::NoData {
                source_id: source_id.to_string(),
            });
        }

        let limit = self.config.sample_limit;
        let identity_field = self.config.identity_field.as_str();

        let partials = try_join_all(
            fragments
                .iter()
                .filter(|fragment| fragment.kind.has_schema())
                .map(|fragment| async move {
                    let documents = self
                        .documents
                        .sample(&fragment.id, fragment.kind, limit)
                        .await?;
                    tracing::debug!(
                        fragment_id = %fragment.id,
                        kind = %fragment.kind,
                        sampled = documents.len(),
                        "sampled fragment documents"
                    );
                    Ok::<_, StrataError>(TypeAccumulator::from_documents(
                        &documents,
                        identity_field,
                    ))
                }),
        )
        .await?;

        Ok(partials
            .into_iter()
            .fold(TypeAccumulator::new(), TypeAccumulator::merge)
            .finish())
    }

    /// Infer and store the next schema version for a source.
    pub async fn infer_schema(&self, source_id: &str) -> Result<SchemaVersion> {
        let lease = self.source_lock(source_id);
        let _guard = lease.lock.lock().await;

        let schema = self.infer_fields(source_id).await?;
        let latest = self.versions.latest(source_id).await?;
        let stored = self
            .versions
            .append(SchemaVersion::next(source_id, latest.as_ref(), schema))
            .await?;

        tracing::info!(
            source_id,
            version = stored.version,
            fields = stored.schema.len(),
            "stored schema version"
        );
        Ok(stored)
    }

    fn source_lock<'a>(&'a self, source_id: &'a str) -> LockLease<'a> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(source_id.to_string()).or_default().clone();
        LockLease {
            locks: &self.locks,
            source_id,
            lock,
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A handle on one source's lock. The last lease to drop removes the entry.
struct LockLease<'a> {
    locks: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    source_id: &'a str,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only made under the map lock, so the count cannot grow here.
        let unused = Arc::strong_count(&self.lock) == 2
            && locks
                .get(self.source_id)
                .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock));
        if unused {
            locks.remove(self.source_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::FragmentKind;
    use crate::store::{Document, FragmentDescriptor, MemoryStore, UploadedFile};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Value, json};

    fn file(id: &str, source: &str) -> UploadedFile {
        UploadedFile {
            id: id.to_string(),
            source_id: Some(source.to_string()),
            filename: "doc.txt".to_string(),
            content_type: None,
            size_bytes: 0,
            content_hash: "sha256:00".to_string(),
            raw_text_excerpt: String::new(),
            created_at: Utc::now(),
        }
    }

    fn descriptor(id: &str, file_id: &str, kind: FragmentKind) -> FragmentDescriptor {
        FragmentDescriptor {
            id: id.to_string(),
            file_id: file_id.to_string(),
            kind,
            start_offset: None,
            end_offset: None,
            record_count: 0,
            preview: Value::Null,
        }
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn engine(store: &Arc<MemoryStore>) -> SchemaInferenceEngine {
        SchemaInferenceEngine::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_no_fragments_is_validation_error() {
        let store = Arc::new(MemoryStore::new());
        let err = engine(&store).infer_schema("empty").await.unwrap_err();
        assert!(matches!(err, StrataError::NoData { .. }));
        assert!(err.is_validation());
        assert!(store.latest("empty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_versions_increment_and_text_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.record_file(&file("f", "crm")).await.unwrap();
        store
            .save_fragment(
                &descriptor("j", "f", FragmentKind::Json),
                vec![doc(json!({"active": true})), doc(json!({"active": 1}))],
            )
            .await
            .unwrap();
        store
            .save_fragment(
                &descriptor("t", "f", FragmentKind::Text),
                vec![doc(json!({"body": "x"}))],
            )
            .await
            .unwrap();

        let engine = engine(&store);
        let v1 = engine.infer_schema("crm").await.unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(
            v1.schema.get("active").map(|f| f.type_names()),
            Some(vec!["boolean".to_string(), "number".to_string()])
        );
        assert!(!v1.schema.contains("body"));
        assert!(!v1.schema.contains("_id"));

        let v2 = engine.infer_schema("crm").await.unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v2.schema, v1.schema);
        assert_eq!(engine.lock_count(), 0);
    }

    #[tokio::test]
    async fn test_sample_limit_bounds_each_fragment() {
        let store = Arc::new(MemoryStore::new());
        store.record_file(&file("f", "crm")).await.unwrap();
        let mut docs: Vec<Document> = (0..3).map(|i| doc(json!({"n": i}))).collect();
        docs.push(doc(json!({"late": "only after the limit"})));
        store
            .save_fragment(&descriptor("c", "f", FragmentKind::Csv), docs)
            .await
            .unwrap();

        let config = InferenceConfig {
            sample_limit: 3,
            ..InferenceConfig::default()
        };
        let engine =
            SchemaInferenceEngine::with_config(config, store.clone(), store.clone(), store.clone());
        let fields = engine.infer_fields("crm").await.unwrap();
        assert!(fields.contains("n"));
        assert!(!fields.contains("late"));
    }

    struct FailingSamples;

    #[async_trait]
    impl DocumentSampleSource for FailingSamples {
        async fn sample(
            &self,
            _fragment_id: &str,
            _kind: FragmentKind,
            _limit: usize,
        ) -> Result<Vec<Document>> {
            Err(StrataError::Storage("document store unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_read_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.record_file(&file("f", "crm")).await.unwrap();
        store
            .save_fragment(
                &descriptor("k", "f", FragmentKind::Kv),
                vec![doc(json!({"a": "b"}))],
            )
            .await
            .unwrap();

        let engine =
            SchemaInferenceEngine::new(store.clone(), Arc::new(FailingSamples), store.clone());
        let err = engine.infer_schema("crm").await.unwrap_err();
        assert!(matches!(err, StrataError::Storage(_)));
        assert!(!err.is_validation());
        assert!(store.list("crm").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_runs_get_distinct_versions() {
        let store = Arc::new(MemoryStore::new());
        store.record_file(&file("f", "crm")).await.unwrap();
        store
            .save_fragment(
                &descriptor("j", "f", FragmentKind::Json),
                vec![doc(json!({"x": 1}))],
            )
            .await
            .unwrap();

        let engine = Arc::new(engine(&store));
        let runs = (0..8).map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.infer_schema("crm").await })
        });
        let mut versions: Vec<u32> = Vec::new();
        for run in runs.collect::<Vec<_>>() {
            versions.push(run.await.unwrap().unwrap().version);
        }
        versions.sort();
        assert_eq!(versions, (1..=8).collect::<Vec<u32>>());
        assert_eq!(engine.lock_count(), 0);
    }

    #[tokio::test]
    async fn test_lock_entries_do_not_accumulate_across_sources() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        for i in 0..100 {
            let source = format!("source-{}", i);
            assert!(engine.infer_schema(&source).await.is_err());
        }
        assert_eq!(engine.lock_count(), 0);
    }

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.sample_limit, 50);
        assert_eq!(config.identity_field, "_id");
        let parsed: InferenceConfig = serde_json::from_str(r#"{"sample_limit": 5}"#).unwrap();
        assert_eq!(parsed.sample_limit, 5);
        assert_eq!(parsed.identity_field, "_id");
    }
}
