//! Ingestion progress and diagnostics side channel.
//!
//! The pipeline never logs through hidden global state alone: every notable
//! step is also reported as an [`IngestEvent`] to the [`IngestObserver`]
//! injected at construction. [`TracingObserver`] is the default and turns
//! events into `tracing` records; the CLI adds a human progress reporter.

use uuid::Uuid;

use crate::models::{IngestionStatus, SourceKind};

/// A single pipeline event.
#[derive(Clone, Debug)]
pub enum IngestEvent {
    /// A single source is about to be read.
    SourceStarted { kind: SourceKind, locator: String },
    /// Content hash already stored; nothing written.
    DuplicateSkipped {
        locator: String,
        existing_id: Uuid,
    },
    /// Specification persisted.
    SpecSaved {
        locator: String,
        spec_id: Uuid,
        name: String,
        version: String,
    },
    /// Best-effort indexing failed; ingestion still succeeds.
    IndexFailed { locator: String, error: String },
    /// The source could not be ingested.
    SourceFailed { locator: String, error: String },
    /// Folder discovery finished.
    FolderDiscovered { root: String, files: usize },
    /// One file of a folder finished (`n` of `total`, completion order).
    FolderProgress {
        file: String,
        status: IngestionStatus,
        n: usize,
        total: usize,
    },
    /// Folder ingestion stopped early on caller request.
    FolderCancelled { processed: usize, total: usize },
}

/// Receives pipeline events. Implementations must be cheap and must not fail.
pub trait IngestObserver: Send + Sync {
    fn report(&self, event: IngestEvent);
}

/// Default observer: forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IngestObserver for TracingObserver {
    fn report(&self, event: IngestEvent) {
        match event {
            IngestEvent::SourceStarted { kind, locator } => {
                tracing::info!(%kind, source = %locator, "starting ingestion")
            }
            IngestEvent::DuplicateSkipped {
                locator,
                existing_id,
            } => tracing::info!(source = %locator, %existing_id, "already ingested (hash match), skipping"),
            IngestEvent::SpecSaved {
                locator,
                spec_id,
                name,
                version,
            } => tracing::info!(source = %locator, %spec_id, api = %name, %version, "saved specification"),
            IngestEvent::IndexFailed { locator, error } => {
                tracing::warn!(source = %locator, %error, "indexing failed; continuing")
            }
            IngestEvent::SourceFailed { locator, error } => {
                tracing::error!(source = %locator, %error, "ingestion failed")
            }
            IngestEvent::FolderDiscovered { root, files } => {
                tracing::info!(%root, files, "discovered configuration files")
            }
            IngestEvent::FolderProgress {
                file,
                status,
                n,
                total,
            } => tracing::debug!(%file, %status, n, total, "file finished"),
            IngestEvent::FolderCancelled { processed, total } => {
                tracing::warn!(processed, total, "folder ingestion cancelled")
            }
        }
    }
}

/// Fan an event out to several observers.
pub struct MultiObserver(pub Vec<std::sync::Arc<dyn IngestObserver>>);

impl IngestObserver for MultiObserver {
    fn report(&self, event: IngestEvent) {
        for observer in &self.0 {
            observer.report(event.clone());
        }
    }
}
