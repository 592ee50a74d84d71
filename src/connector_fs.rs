//! Local filesystem [`SourceReader`].
//!
//! Discovery walks the root with `walkdir` (only the top level unless
//! recursive) and keeps files whose name matches a case-insensitive
//! `*.{ext,...}` glob. Only the root itself is checked up front: an
//! unreadable subdirectory or a dangling symlink met during the walk is
//! logged and skipped. Results are sorted for deterministic ordering.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use api_ingest_core::error::{IngestError, Result};
use api_ingest_core::source::SourceReader;

#[derive(Debug, Clone, Default)]
pub struct LocalFs {
    follow_symlinks: bool,
}

impl LocalFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    fn scan(&self, root: &Path, extensions: &[&str], recursive: bool) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(IngestError::SourceNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(IngestError::NotADirectory(root.to_path_buf()));
        }

        let include_set = extension_globset(extensions)?;

        let mut walker = WalkDir::new(root).follow_links(self.follow_symlinks);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let at = e.path().unwrap_or(root).display().to_string();
                    tracing::warn!(path = %at, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !include_set.is_match(entry.file_name()) {
                continue;
            }
            files.push(entry.path().to_path_buf());
        }

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl SourceReader for LocalFs {
    async fn list(
        &self,
        root: &Path,
        extensions: &[&str],
        recursive: bool,
    ) -> Result<Vec<PathBuf>> {
        self.scan(root, extensions, recursive)
    }

    async fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| IngestError::io(path, e))
    }
}

fn extension_globset(extensions: &[&str]) -> Result<GlobSet> {
    let pattern = format!("*.{{{}}}", extensions.join(","));
    let glob = GlobBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| IngestError::validation(format!("bad extension list: {}", e)))?;
    let mut builder = GlobSetBuilder::new();
    builder.add(glob);
    builder
        .build()
        .map_err(|e| IngestError::validation(format!("bad extension list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_ingest_core::flat::CONFIG_EXTENSIONS;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.yaml"), "name: B").unwrap();
        fs::write(dir.path().join("a.JSON"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.yml"), "name: C").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/d.json"), "{}").unwrap();
        dir
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[tokio::test]
    async fn top_level_only_by_default() {
        let dir = tree();
        let files = LocalFs::new()
            .list(dir.path(), &CONFIG_EXTENSIONS, false)
            .await
            .unwrap();
        assert_eq!(names(dir.path(), &files), vec!["a.JSON", "b.yaml"]);
    }

    #[tokio::test]
    async fn recursive_walk_lists_every_subdirectory() {
        let dir = tree();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/x.yaml"), "name: X").unwrap();

        let files = LocalFs::new()
            .list(dir.path(), &CONFIG_EXTENSIONS, true)
            .await
            .unwrap();
        assert_eq!(
            names(dir.path(), &files),
            vec![
                "a.JSON",
                "b.yaml",
                "nested/c.yml",
                "node_modules/pkg/d.json",
                "target/x.yaml"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_is_skipped_not_fatal() {
        let dir = tree();
        std::os::unix::fs::symlink(
            dir.path().join("gone"),
            dir.path().join("nested/broken.yaml"),
        )
        .unwrap();

        let files = LocalFs::new()
            .follow_symlinks(true)
            .list(dir.path(), &CONFIG_EXTENSIONS, true)
            .await
            .unwrap();
        assert!(names(dir.path(), &files).contains(&"nested/c.yml".to_string()));
        assert!(!files.iter().any(|p| p.ends_with("broken.yaml")));
    }

    #[tokio::test]
    async fn missing_root_and_file_root_fail_fast() {
        let dir = tree();
        let fs = LocalFs::new();

        let err = fs
            .list(&dir.path().join("absent"), &CONFIG_EXTENSIONS, false)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound(_)));
        assert!(err.to_string().starts_with("Folder does not exist: "));

        let err = fs
            .list(&dir.path().join("b.yaml"), &CONFIG_EXTENSIONS, false)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }
}
