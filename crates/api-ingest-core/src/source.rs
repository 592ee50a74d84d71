//! Filesystem collaborator.
//!
//! The core never touches the filesystem directly; discovery and reads go
//! through a [`SourceReader`] so tests can substitute an in-memory tree.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait SourceReader: Send + Sync {
    /// List files under `root` whose extension (case-insensitive) is one of
    /// `extensions`. Only the immediate directory unless `recursive`.
    ///
    /// # Errors
    ///
    /// [`SourceNotFound`](crate::error::IngestError::SourceNotFound) when
    /// `root` does not exist and
    /// [`NotADirectory`](crate::error::IngestError::NotADirectory) when it
    /// is not a directory. Both are raised before anything is listed.
    async fn list(&self, root: &Path, extensions: &[&str], recursive: bool)
        -> Result<Vec<PathBuf>>;

    /// Read the full contents of a file.
    async fn read_all(&self, path: &Path) -> Result<Vec<u8>>;
}
