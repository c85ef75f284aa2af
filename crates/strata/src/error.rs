//! Error types for the Strata library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Schema inference was requested for a source with no fragments.
    #[error("No data: source '{source_id}' has no extracted fragments")]
    NoData { source_id: String },

    /// A requested schema version does not exist.
    #[error("Schema version {version} not found for source '{source_id}'")]
    VersionNotFound { source_id: String, version: u32 },

    /// A requested uploaded file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Another inference run already stored this version number.
    #[error("Schema version {version} already exists for source '{source_id}'")]
    VersionConflict { source_id: String, version: u32 },

    /// A storage collaborator failed or returned unusable data.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// Returns true for caller mistakes that must never be retried.
    ///
    /// Only [`StrataError::NoData`] qualifies; everything else comes from a
    /// collaborator and the retry decision belongs to the caller.
    pub fn is_validation(&self) -> bool {
        matches!(self, StrataError::NoData { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StrataError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
