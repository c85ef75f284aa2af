//! Upload pipeline: hash, decode, extract, and persist one file.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::extract::{FragmentCounts, extract};
use crate::fragment::Fragment;
use crate::store::{FragmentDescriptor, FragmentStore, UploadedFile};

/// Configuration for stored previews and excerpts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Records kept in a fragment preview.
    pub preview_rows: usize,
    /// Characters kept from the raw text and from text fragment previews.
    pub excerpt_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            preview_rows: 3,
            excerpt_chars: 1000,
        }
    }
}

/// Outcome of ingesting one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub file_id: String,
    pub content_hash: String,
    /// Length of the decoded text in characters.
    pub raw_text_length: usize,
    pub fragments: FragmentCounts,
}

/// Decode uploaded bytes as text, replacing invalid UTF-8 sequences.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// `sha256:<hex>` digest of raw bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Writes uploaded files and their fragments to a [`FragmentStore`].
pub struct Ingestor {
    config: IngestConfig,
    store: Arc<dyn FragmentStore>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn FragmentStore>) -> Self {
        Self::with_config(IngestConfig::default(), store)
    }

    pub fn with_config(config: IngestConfig, store: Arc<dyn FragmentStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one file.
    ///
    /// Every typed fragment is stored with its documents. The residual text
    /// fragment is stored only when it is non-empty. Identical content is
    /// stored again under a new file id.
    pub async fn ingest(
        &self,
        source_id: Option<&str>,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<IngestReport> {
        let text = decode_text(bytes);
        let file = UploadedFile {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.map(str::to_string),
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            size_bytes: bytes.len() as u64,
            content_hash: content_hash(bytes),
            raw_text_excerpt: text.chars().take(self.config.excerpt_chars).collect(),
            created_at: Utc::now(),
        };
        self.store.record_file(&file).await?;

        let extraction = extract(&text);
        for fragment in extraction.typed() {
            self.save(&file.id, fragment).await?;
        }
        if extraction.has_text() {
            self.save(&file.id, &extraction.text_block).await?;
        }

        let fragments = extraction.counts();
        tracing::info!(
            file_id = %file.id,
            filename,
            source_id = source_id.unwrap_or("-"),
            json = fragments.json_blocks,
            csv = fragments.csv_blocks,
            kv = fragments.kv_blocks,
            html = fragments.html_tables,
            "ingested file"
        );

        Ok(IngestReport {
            file_id: file.id,
            content_hash: file.content_hash,
            raw_text_length: text.chars().count(),
            fragments,
        })
    }

    async fn save(&self, file_id: &str, fragment: &Fragment) -> Result<()> {
        let descriptor = FragmentDescriptor::describe(
            file_id,
            fragment,
            self.config.preview_rows,
            self.config.excerpt_chars,
        );
        self.store
            .save_fragment(&descriptor, fragment.documents())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::FragmentKind;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_content_hash_format() {
        let hash = content_hash(b"hello");
        assert_eq!(
            hash,
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_decode_replaces_invalid_bytes() {
        assert_eq!(decode_text(b"ok\xffok"), "ok\u{fffd}ok");
    }

    #[tokio::test]
    async fn test_ingest_stores_file_and_fragments() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone());

        let report = ingestor
            .ingest(
                Some("crm"),
                "mixed.txt",
                Some("text/plain"),
                b"a,b\n1,2\n3,4\nname: bob\n{\"x\": 1}",
            )
            .await
            .unwrap();

        assert_eq!(report.fragments.csv_blocks, 1);
        assert_eq!(report.fragments.kv_blocks, 1);
        assert_eq!(report.fragments.json_blocks, 1);
        assert!(report.fragments.text_block);

        let file = store.get_file(&report.file_id).await.unwrap().unwrap();
        assert_eq!(file.source_id.as_deref(), Some("crm"));
        assert_eq!(file.content_hash, report.content_hash);

        let fragments = store.fragments_for_file(&report.file_id, None).await.unwrap();
        assert_eq!(fragments.len(), 4);

        let csv = store
            .fragments_for_file(&report.file_id, Some(FragmentKind::Csv))
            .await
            .unwrap();
        assert_eq!(csv[0].record_count, 2);
        assert_eq!(csv[0].preview, json!([{"a": "1", "b": "2"}, {"a": "3", "b": "4"}]));
    }

    #[tokio::test]
    async fn test_blank_upload_stores_no_text_fragment() {
        let store = Arc::new(MemoryStore::new());
        let report = Ingestor::new(store.clone())
            .ingest(None, "blank.txt", None, b"  \n\t ")
            .await
            .unwrap();

        assert!(!report.fragments.text_block);
        assert!(
            store
                .fragments_for_file(&report.file_id, None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_excerpt_and_preview_are_bounded() {
        let store = Arc::new(MemoryStore::new());
        let config = IngestConfig {
            preview_rows: 1,
            excerpt_chars: 4,
        };
        let ingestor = Ingestor::with_config(config, store.clone());
        let report = ingestor
            .ingest(None, "t.csv", None, b"a,b\n1,2\n3,4")
            .await
            .unwrap();

        let file = store.get_file(&report.file_id).await.unwrap().unwrap();
        assert_eq!(file.raw_text_excerpt, "a,b\n");
        assert_eq!(report.raw_text_length, 11);

        let csv = store
            .fragments_for_file(&report.file_id, Some(FragmentKind::Csv))
            .await
            .unwrap();
        assert_eq!(csv[0].preview, json!([{"a": "1", "b": "2"}]));

        let text = store
            .fragments_for_file(&report.file_id, Some(FragmentKind::Text))
            .await
            .unwrap();
        assert_eq!(text[0].preview, json!("a,b\n"));
    }

    #[tokio::test]
    async fn test_duplicate_upload_gets_new_id() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone());
        let first = ingestor.ingest(None, "a", None, b"x: 1").await.unwrap();
        let second = ingestor.ingest(None, "a", None, b"x: 1").await.unwrap();
        assert_ne!(first.file_id, second.file_id);
        assert_eq!(first.content_hash, second.content_hash);
    }
}
