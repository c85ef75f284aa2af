//! In-memory store for tests and embedding.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Stored documents receive an
//! `_id` identity field the way a document database would assign one.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, StrataError};
use crate::fragment::FragmentKind;
use crate::schema::SchemaVersion;

use super::{
    Document, DocumentSampleSource, FragmentDescriptor, FragmentStore, SchemaVersionStore,
    SourceSummary, UploadedFile,
};

/// Identity field assigned to every stored document.
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// In-memory implementation of every storage trait.
pub struct MemoryStore {
    files: RwLock<HashMap<String, UploadedFile>>,
    fragments: RwLock<Vec<FragmentDescriptor>>,
    documents: RwLock<HashMap<String, Vec<Document>>>,
    versions: RwLock<HashMap<String, BTreeMap<u32, SchemaVersion>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            fragments: RwLock::new(Vec::new()),
            documents: RwLock::new(HashMap::new()),
            versions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StrataError::Storage("memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StrataError::Storage("memory store lock poisoned".to_string()))
}

#[async_trait]
impl FragmentStore for MemoryStore {
    async fn record_file(&self, file: &UploadedFile) -> Result<()> {
        write(&self.files)?.insert(file.id.clone(), file.clone());
        Ok(())
    }

    async fn save_fragment(
        &self,
        descriptor: &FragmentDescriptor,
        documents: Vec<Document>,
    ) -> Result<()> {
        let documents: Vec<Document> = documents
            .into_iter()
            .map(|mut doc| {
                doc.entry(DOCUMENT_ID_FIELD)
                    .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
                doc
            })
            .collect();

        write(&self.documents)?.insert(descriptor.id.clone(), documents);
        write(&self.fragments)?.push(descriptor.clone());
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<UploadedFile>> {
        Ok(read(&self.files)?.get(file_id).cloned())
    }

    async fn list_files(&self, limit: usize, offset: usize) -> Result<Vec<UploadedFile>> {
        let mut files: Vec<UploadedFile> = read(&self.files)?.values().cloned().collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(files.into_iter().skip(offset).take(limit).collect())
    }

    async fn fragments_for_file(
        &self,
        file_id: &str,
        kind: Option<FragmentKind>,
    ) -> Result<Vec<FragmentDescriptor>> {
        let mut fragments: Vec<FragmentDescriptor> = read(&self.fragments)?
            .iter()
            .filter(|f| f.file_id == file_id && kind.is_none_or(|k| f.kind == k))
            .cloned()
            .collect();
        fragments.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));
        Ok(fragments)
    }

    async fn fragments_for_source(&self, source_id: &str) -> Result<Vec<FragmentDescriptor>> {
        let file_ids: Vec<String> = read(&self.files)?
            .values()
            .filter(|f| f.source_id.as_deref() == Some(source_id))
            .map(|f| f.id.clone())
            .collect();

        Ok(read(&self.fragments)?
            .iter()
            .filter(|f| file_ids.contains(&f.file_id))
            .cloned()
            .collect())
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for file in read(&self.files)?.values() {
            if let Some(source_id) = &file.source_id {
                *counts.entry(source_id.clone()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(source_id, file_count)| SourceSummary {
                source_id,
                file_count,
            })
            .collect())
    }
}

#[async_trait]
impl DocumentSampleSource for MemoryStore {
    async fn sample(
        &self,
        fragment_id: &str,
        _kind: FragmentKind,
        limit: usize,
    ) -> Result<Vec<Document>> {
        Ok(read(&self.documents)?
            .get(fragment_id)
            .map(|docs| docs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SchemaVersionStore for MemoryStore {
    async fn latest(&self, source_id: &str) -> Result<Option<SchemaVersion>> {
        Ok(read(&self.versions)?
            .get(source_id)
            .and_then(|versions| versions.values().next_back().cloned()))
    }

    async fn append(&self, version: SchemaVersion) -> Result<SchemaVersion> {
        let mut versions = write(&self.versions)?;
        let history = versions.entry(version.source_id.clone()).or_default();
        if history.contains_key(&version.version) {
            return Err(StrataError::VersionConflict {
                source_id: version.source_id,
                version: version.version,
            });
        }
        history.insert(version.version, version.clone());
        Ok(version)
    }

    async fn get(&self, source_id: &str, version: u32) -> Result<Option<SchemaVersion>> {
        Ok(read(&self.versions)?
            .get(source_id)
            .and_then(|versions| versions.get(&version).cloned()))
    }

    async fn list(&self, source_id: &str) -> Result<Vec<SchemaVersion>> {
        Ok(read(&self.versions)?
            .get(source_id)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default())
    }
}
