//! Storage abstraction for API Ingest.
//!
//! The [`SpecStore`] trait defines every persistence operation the ingestion
//! pipeline and the history queries need, enabling pluggable backends
//! (SQLite in the application crate, in-memory here for tests).
//!
//! Implementations must be `Send + Sync` so a single store can be shared by
//! concurrent folder-ingestion workers.
//!
//! # Uniqueness
//!
//! The pipeline's exact-duplicate check ([`find_by_content_hash`]) and the
//! subsequent [`save`] are not one atomic unit. When files are processed
//! concurrently, two workers holding identical content can both miss the
//! lookup. Backends should enforce uniqueness on `content_hash` so the
//! second save fails instead of creating a twin record.
//!
//! [`find_by_content_hash`]: SpecStore::find_by_content_hash
//! [`save`]: SpecStore::save

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{IngestionResult, Specification};

/// Abstract storage backend for specifications and ingestion history.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_by_content_hash`](SpecStore::find_by_content_hash) | Global exact-duplicate lookup |
/// | [`find_by_name_and_version`](SpecStore::find_by_name_and_version) | Change-detection baseline |
/// | [`find_by_id`](SpecStore::find_by_id) | Retrieve one record |
/// | [`list`](SpecStore::list) | Paginated listing, newest first |
/// | [`save`](SpecStore::save) | Persist a new specification |
/// | [`save_ingestion_result`](SpecStore::save_ingestion_result) | Append to audit history |
/// | [`recent_ingestions`](SpecStore::recent_ingestions) | Audit history, newest first |
#[async_trait]
pub trait SpecStore: Send + Sync {
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Specification>>;

    /// Exact match on both name and canonical version string.
    async fn find_by_name_and_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<Specification>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Specification>>;

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Specification>>;

    /// Persist a specification and return the stored copy.
    async fn save(&self, spec: Specification) -> Result<Specification>;

    /// Append an ingestion result to the audit history. Results are never
    /// updated once written.
    async fn save_ingestion_result(&self, result: IngestionResult) -> Result<IngestionResult>;

    async fn recent_ingestions(&self, limit: usize) -> Result<Vec<IngestionResult>>;
}
