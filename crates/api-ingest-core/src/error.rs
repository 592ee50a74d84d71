//! Error types for API Ingest.
//!
//! The core crate reports failures through [`IngestError`] (via `thiserror`).
//! The application crate wraps these with `anyhow` at the CLI boundary.

use std::path::PathBuf;

/// Every failure the ingestion core can produce.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A version string could not be parsed.
    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    /// Content cannot be turned into a canonical API config at all.
    #[error("{0}")]
    Parse(String),

    /// Folder ingestion root does not exist.
    #[error("Folder does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Folder ingestion root exists but is not a directory.
    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Storage collaborator failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Embedding/indexing collaborator failure. Never escapes the pipeline.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Filesystem I/O error while reading a source.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Entity invariant violated (empty name, empty hash, ...).
    #[error("{0}")]
    Validation(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }

    pub fn embedding(msg: impl std::fmt::Display) -> Self {
        Self::Embedding(msg.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap a `std::io::Error` with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
