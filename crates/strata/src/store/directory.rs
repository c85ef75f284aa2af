//! JSON file store rooted at a directory.
//!
//! Layout:
//!
//! ```text
//! <root>/
//! ├── files/<file_id>.json
//! ├── fragments/<fragment_id>.json
//! ├── documents/<fragment_id>.json
//! └── schemas/<sha256(source_id)>/v<version>.json
//! ```
//!
//! Every file is written to a temporary sibling first. Metadata is moved
//! into place with a rename; schema versions are hard-linked into place,
//! which fails if the version already exists, so two concurrent writers can
//! never both claim the same version number.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::error::{Result, StrataError};
use crate::fragment::FragmentKind;
use crate::schema::SchemaVersion;

use super::memory::DOCUMENT_ID_FIELD;
use super::{
    Document, DocumentSampleSource, FragmentDescriptor, FragmentStore, SchemaVersionStore,
    SourceSummary, UploadedFile,
};

const TEMP_SUFFIX: &str = ".partial";

/// File-backed implementation of every storage trait.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store, creating the directory layout if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in ["files", "fragments", "documents", "schemas"] {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .await
                .map_err(|e| StrataError::io(&path, e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<dir>/<id>.json`. Ids that could leave `dir` are rejected.
    fn entry_path(&self, dir: &str, id: &str) -> Result<PathBuf> {
        let unsafe_id = id.is_empty()
            || id.contains("..")
            || id.contains(['/', '\\', '\0'])
            || Path::new(id).is_absolute();
        if unsafe_id {
            return Err(StrataError::Storage(format!("invalid id '{}'", id)));
        }
        Ok(self.root.join(dir).join(format!("{}.json", id)))
    }

    fn file_path(&self, file_id: &str) -> Result<PathBuf> {
        self.entry_path("files", file_id)
    }

    fn fragment_path(&self, fragment_id: &str) -> Result<PathBuf> {
        self.entry_path("fragments", fragment_id)
    }

    fn documents_path(&self, fragment_id: &str) -> Result<PathBuf> {
        self.entry_path("documents", fragment_id)
    }

    fn source_dir(&self, source_id: &str) -> PathBuf {
        self.root.join("schemas").join(source_key(source_id))
    }

    fn version_path(&self, source_id: &str, version: u32) -> PathBuf {
        self.source_dir(source_id).join(format!("v{}.json", version))
    }
}

/// Directory name for a source id that is safe on any filesystem.
fn source_key(source_id: &str) -> String {
    format!("{:x}", Sha256::digest(source_id.as_bytes()))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}{}", uuid::Uuid::new_v4(), TEMP_SUFFIX));
    path.with_file_name(name)
}

async fn write_temp<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let temp = temp_path(path);
    fs::write(&temp, bytes)
        .await
        .map_err(|e| StrataError::io(&temp, e))?;
    Ok(temp)
}

/// Write a file so readers see either the old content or the new content.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let temp = write_temp(path, value).await?;
    fs::rename(&temp, path)
        .await
        .map_err(|e| StrataError::io(path, e))
}

/// Write a file that must not exist yet. Returns `false` if it already does.
async fn create_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<bool> {
    let temp = write_temp(path, value).await?;
    let linked = fs::hard_link(&temp, path).await;
    let _ = fs::remove_file(&temp).await;
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StrataError::io(path, e)),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StrataError::io(path, e)),
    }
}

/// Every complete `.json` file in a directory, in file-name order.
async fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StrataError::io(dir, e)),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StrataError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

async fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for path in json_files(dir).await? {
        if let Some(item) = read_json(&path).await? {
            items.push(item);
        }
    }
    Ok(items)
}

#[async_trait]
impl FragmentStore for DirectoryStore {
    async fn record_file(&self, file: &UploadedFile) -> Result<()> {
        write_json(&self.file_path(&file.id)?, file).await
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

        let documents_path = self.documents_path(&descriptor.id)?;
        let fragment_path = self.fragment_path(&descriptor.id)?;
        // Documents first, so a visible descriptor always has its documents.
        write_json(&documents_path, &documents).await?;
        write_json(&fragment_path, descriptor).await
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<UploadedFile>> {
        read_json(&self.file_path(file_id)?).await
    }

    async fn list_files(&self, limit: usize, offset: usize) -> Result<Vec<UploadedFile>> {
        let mut files: Vec<UploadedFile> = read_all(&self.root.join("files")).await?;
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(files.into_iter().skip(offset).take(limit).collect())
    }

    async fn fragments_for_file(
        &self,
        file_id: &str,
        kind: Option<FragmentKind>,
    ) -> Result<Vec<FragmentDescriptor>> {
        let mut fragments: Vec<FragmentDescriptor> = read_all(&self.root.join("fragments"))
            .await?
            .into_iter()
            .filter(|f: &FragmentDescriptor| {
                f.file_id == file_id && kind.is_none_or(|k| f.kind == k)
            })
            .collect();
        fragments.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));
        Ok(fragments)
    }

    async fn fragments_for_source(&self, source_id: &str) -> Result<Vec<FragmentDescriptor>> {
        let file_ids: Vec<String> = read_all::<UploadedFile>(&self.root.join("files"))
            .await?
            .into_iter()
            .filter(|f| f.source_id.as_deref() == Some(source_id))
            .map(|f| f.id)
            .collect();
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(read_all::<FragmentDescriptor>(&self.root.join("fragments"))
            .await?
            .into_iter()
            .filter(|f| file_ids.contains(&f.file_id))
            .collect())
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for file in read_all::<UploadedFile>(&self.root.join("files")).await? {
            if let Some(source_id) = file.source_id {
                *counts.entry(source_id).or_default() += 1;
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
impl DocumentSampleSource for DirectoryStore {
    async fn sample(
        &self,
        fragment_id: &str,
        _kind: FragmentKind,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let documents: Vec<Document> = read_json(&self.documents_path(fragment_id)?)
            .await?
            .unwrap_or_default();
        Ok(documents.into_iter().take(limit).collect())
    }
}

#[async_trait]
impl SchemaVersionStore for DirectoryStore {
    async fn latest(&self, source_id: &str) -> Result<Option<SchemaVersion>> {
        Ok(self.list(source_id).await?.pop())
    }

    async fn append(&self, version: SchemaVersion) -> Result<SchemaVersion> {
        let dir = self.source_dir(&version.source_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StrataError::io(&dir, e))?;

        let path = self.version_path(&version.source_id, version.version);
        if !create_json(&path, &version).await? {
            return Err(StrataError::VersionConflict {
                source_id: version.source_id,
                version: version.version,
            });
        }
        Ok(version)
    }

    async fn get(&self, source_id: &str, version: u32) -> Result<Option<SchemaVersion>> {
        read_json(&self.version_path(source_id, version)).await
    }

    async fn list(&self, source_id: &str) -> Result<Vec<SchemaVersion>> {
        let mut versions: Vec<SchemaVersion> = read_all(&self.source_dir(source_id)).await?;
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }
}
