//! In-memory [`SpecStore`] implementation for testing and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Like the SQLite backend it
//! rejects a second specification with an already stored content hash.

use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::models::{IngestionResult, Specification};

use super::SpecStore;

/// In-memory store. Insertion order is kept; listings are newest first.
pub struct InMemoryStore {
    specs: RwLock<Vec<Specification>>,
    results: RwLock<Vec<IngestionResult>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            specs: RwLock::new(Vec::new()),
            results: RwLock::new(Vec::new()),
        }
    }

    pub fn spec_count(&self) -> usize {
        self.specs.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn result_count(&self) -> usize {
        self.results.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> IngestError {
    IngestError::storage("in-memory store lock poisoned")
}

#[async_trait]
impl SpecStore for InMemoryStore {
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Specification>> {
        let specs = self.specs.read().map_err(poisoned)?;
        Ok(specs
            .iter()
            .find(|s| s.content_hash == content_hash)
            .cloned())
    }

    async fn find_by_name_and_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<Specification>> {
        let specs = self.specs.read().map_err(poisoned)?;
        Ok(specs
            .iter()
            .rev()
            .find(|s| s.name == name && s.version.to_string() == version)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Specification>> {
        let specs = self.specs.read().map_err(poisoned)?;
        Ok(specs.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Specification>> {
        let specs = self.specs.read().map_err(poisoned)?;
        Ok(specs.iter().rev().skip(offset).take(limit).cloned().collect())
    }

    async fn save(&self, spec: Specification) -> Result<Specification> {
        let mut specs = self.specs.write().map_err(poisoned)?;
        if specs.iter().any(|s| s.content_hash == spec.content_hash) {
            return Err(IngestError::storage(format!(
                "UNIQUE constraint failed: content_hash {}",
                spec.content_hash
            )));
        }
        specs.push(spec.clone());
        Ok(spec)
    }

    async fn save_ingestion_result(&self, result: IngestionResult) -> Result<IngestionResult> {
        let mut results = self.results.write().map_err(poisoned)?;
        results.push(result.clone());
        Ok(result)
    }

    async fn recent_ingestions(&self, limit: usize) -> Result<Vec<IngestionResult>> {
        let results = self.results.read().map_err(poisoned)?;
        Ok(results.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiConfig, IngestionStatus, SourceKind};
    use crate::version::Version;

    fn spec(name: &str, version: Version, hash: &str) -> Specification {
        let metadata = ApiConfig {
            name: name.to_string(),
            version: Some(version.to_string()),
            description: String::new(),
            endpoints: Vec::new(),
            source: "file".to_string(),
            collection_id: None,
            extra: serde_json::Map::new(),
        };
        Specification::new(name, version, SourceKind::File, "x.yaml", hash, metadata, None)
            .unwrap()
    }

    #[tokio::test]
    async fn lookups_by_hash_and_name_version() {
        let store = InMemoryStore::new();
        let saved = store
            .save(spec("Pets", Version::new(1, 2, 0), "h1"))
            .await
            .unwrap();

        let by_hash = store.find_by_content_hash("h1").await.unwrap().unwrap();
        assert_eq!(by_hash.id, saved.id);
        assert!(store.find_by_content_hash("h2").await.unwrap().is_none());

        let by_nv = store
            .find_by_name_and_version("Pets", "1.2.0")
            .await
            .unwrap();
        assert_eq!(by_nv.map(|s| s.id), Some(saved.id));
        assert!(store
            .find_by_name_and_version("Pets", "1.2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_hash_is_rejected() {
        let store = InMemoryStore::new();
        store.save(spec("A", Version::default(), "same")).await.unwrap();
        let err = store
            .save(spec("B", Version::default(), "same"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Storage(_)));
        assert_eq!(store.spec_count(), 1);
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            store
                .save(spec(&format!("api-{}", i), Version::default(), &format!("h{}", i)))
                .await
                .unwrap();
            store
                .save_ingestion_result(IngestionResult::new(
                    SourceKind::File,
                    format!("f{}", i),
                    IngestionStatus::Success,
                    1,
                    Vec::new(),
                    None,
                ))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list(2, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["api-2", "api-1"]);

        let recent = store.recent_ingestions(10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].source_path, "f2");
    }
}
