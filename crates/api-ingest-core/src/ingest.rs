//! Ingestion pipeline: single sources and whole folders.
//!
//! [`IngestPipeline`] turns one source (a flat config file or a Postman
//! collection) into at most one persisted [`Specification`] and always
//! answers with an [`IngestionResult`]. Failures are data, not errors:
//! the single-source entry points never return `Err`.
//!
//! # Algorithm
//!
//! ```text
//! read bytes ─► sha256 ─► hash known? ──yes──► success, 0 ingested, no writes
//!                              │ no
//!                              ▼
//!                 parse ─► resolve version ─► build record ─► save
//!                                                               │
//!                        index (best effort, errors dropped) ◄──┘
//!                              │
//!                              ▼
//!                   save audit result ─► return
//! ```
//!
//! Any error before the save produces a `failed` result that is recorded
//! in the audit history and returned.
//!
//! # Folders
//!
//! [`IngestPipeline::ingest_folder`] lists `.yaml`/`.yml`/`.json` files,
//! sorts them, runs the single-file pipeline for each (up to `workers` at
//! once, results kept in sorted order) and folds the per-file results into
//! one aggregate. Only a missing or non-directory root is an `Err`.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde_json::Value;
use uuid::Uuid;

use crate::change::content_hash;
use crate::collection::parse_collection;
use crate::error::{IngestError, Result};
use crate::flat::{parse_config, CONFIG_EXTENSIONS};
use crate::index::{summary_text, SpecIndexer};
use crate::models::{ApiConfig, IngestionResult, IngestionStatus, SourceKind, Specification};
use crate::observer::{IngestEvent, IngestObserver, TracingObserver};
use crate::source::SourceReader;
use crate::store::SpecStore;
use crate::version::Version;

/// Shared cooperative cancellation switch for folder ingestion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for [`IngestPipeline::ingest_folder`].
#[derive(Debug, Clone)]
pub struct FolderOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    pub created_by: Option<Uuid>,
    /// Maximum number of files in flight. Values below 1 are treated as 1.
    pub workers: usize,
    pub cancel: Option<CancelFlag>,
}

impl Default for FolderOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            created_by: None,
            workers: 1,
            cancel: None,
        }
    }
}

/// Outcome of one file inside a folder run.
#[derive(Debug, Clone)]
enum FileOutcome {
    Finished(IngestionResult),
    /// The per-file pipeline panicked; only the message survives.
    Crashed(String),
    /// Not started because the run was cancelled.
    Skipped,
}

enum Staged {
    Duplicate(Specification),
    Saved(Specification),
}

pub struct IngestPipeline {
    store: Arc<dyn SpecStore>,
    indexer: Arc<dyn SpecIndexer>,
    reader: Arc<dyn SourceReader>,
    observer: Arc<dyn IngestObserver>,
}

impl IngestPipeline {
    /// Build a pipeline that reports through [`TracingObserver`].
    pub fn new(
        store: Arc<dyn SpecStore>,
        indexer: Arc<dyn SpecIndexer>,
        reader: Arc<dyn SourceReader>,
    ) -> Self {
        Self {
            store,
            indexer,
            reader,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn IngestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &Arc<dyn SpecStore> {
        &self.store
    }

    /// Ingest one flat YAML/JSON configuration file.
    pub async fn ingest_file(&self, path: &Path, created_by: Option<Uuid>) -> IngestionResult {
        let locator = path.display().to_string();
        self.observer.report(IngestEvent::SourceStarted {
            kind: SourceKind::File,
            locator: locator.clone(),
        });

        let staged = self.stage_file(path, &locator, created_by).await;
        self.finish(SourceKind::File, &locator, staged).await
    }

    /// Ingest an already-decoded Postman collection.
    ///
    /// The dedup hash covers the canonical serialization of `collection`,
    /// so re-exports that only differ in whitespace or key order are
    /// recognised as duplicates.
    pub async fn ingest_collection(
        &self,
        collection: &Value,
        locator: &str,
        created_by: Option<Uuid>,
    ) -> IngestionResult {
        self.observer.report(IngestEvent::SourceStarted {
            kind: SourceKind::Postman,
            locator: locator.to_string(),
        });

        let staged = self.stage_collection(collection, locator, created_by).await;
        self.finish(SourceKind::Postman, locator, staged).await
    }

    /// Read and decode a collection export from disk, then ingest it.
    pub async fn ingest_collection_file(
        &self,
        path: &Path,
        created_by: Option<Uuid>,
    ) -> IngestionResult {
        let locator = path.display().to_string();
        let decoded = match self.reader.read_all(path).await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| IngestError::parse(format!("Invalid JSON: {}", e))),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(collection) => self.ingest_collection(&collection, &locator, created_by).await,
            Err(e) => self.finish(SourceKind::Postman, &locator, Err(e)).await,
        }
    }

    /// Ingest every configuration file under `root`.
    ///
    /// # Errors
    ///
    /// Only the root precondition fails: [`IngestError::SourceNotFound`] or
    /// [`IngestError::NotADirectory`] from the reader. Per-file problems end
    /// up in the aggregate's status and message.
    pub async fn ingest_folder(
        &self,
        root: &Path,
        options: &FolderOptions,
    ) -> Result<IngestionResult> {
        let mut files = self
            .reader
            .list(root, &CONFIG_EXTENSIONS, options.recursive)
            .await?;
        files.sort();
        files.dedup();

        let locator = root.display().to_string();
        let total = files.len();
        self.observer.report(IngestEvent::FolderDiscovered {
            root: locator.clone(),
            files: total,
        });

        if files.is_empty() {
            let result = IngestionResult::new(
                SourceKind::File,
                locator,
                IngestionStatus::Success,
                0,
                Vec::new(),
                Some("No configuration files found".to_string()),
            );
            return Ok(self.record(result).await);
        }

        let done = AtomicUsize::new(0);
        let workers = options.workers.max(1);

        let outcomes: Vec<(PathBuf, FileOutcome)> = stream::iter(files)
            .map(|path| {
                let done = &done;
                async move {
                    if options.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                        return (path, FileOutcome::Skipped);
                    }

                    let outcome = match AssertUnwindSafe(self.ingest_file(&path, options.created_by))
                        .catch_unwind()
                        .await
                    {
                        Ok(result) => FileOutcome::Finished(result),
                        Err(panic) => FileOutcome::Crashed(panic_message(panic.as_ref())),
                    };

                    let status = match &outcome {
                        FileOutcome::Finished(r) => r.status,
                        _ => IngestionStatus::Failed,
                    };
                    let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                    self.observer.report(IngestEvent::FolderProgress {
                        file: file_label(&path),
                        status,
                        n,
                        total,
                    });
                    (path, outcome)
                }
            })
            .buffered(workers)
            .collect()
            .await;

        let processed = done.load(Ordering::SeqCst);
        if processed < total {
            self.observer
                .report(IngestEvent::FolderCancelled { processed, total });
        }

        let aggregate = aggregate(&locator, &outcomes);
        Ok(self.record(aggregate).await)
    }

    async fn stage_file(
        &self,
        path: &Path,
        locator: &str,
        created_by: Option<Uuid>,
    ) -> Result<Staged> {
        let bytes = self.reader.read_all(path).await?;
        let hash = content_hash(&bytes);

        if let Some(existing) = self.store.find_by_content_hash(&hash).await? {
            return Ok(Staged::Duplicate(existing));
        }

        let text = std::str::from_utf8(&bytes)
            .map_err(|e| IngestError::parse(format!("File is not valid UTF-8: {}", e)))?;
        let config = parse_config(text, path)?;

        self.save_spec(SourceKind::File, locator, hash, config, created_by)
            .await
            .map(Staged::Saved)
    }

    async fn stage_collection(
        &self,
        collection: &Value,
        locator: &str,
        created_by: Option<Uuid>,
    ) -> Result<Staged> {
        let canonical = serde_json::to_string(collection)
            .map_err(|e| IngestError::parse(format!("Invalid collection: {}", e)))?;
        let hash = content_hash(canonical);

        if let Some(existing) = self.store.find_by_content_hash(&hash).await? {
            return Ok(Staged::Duplicate(existing));
        }

        let config = parse_collection(collection)?;
        self.save_spec(SourceKind::Postman, locator, hash, config, created_by)
            .await
            .map(Staged::Saved)
    }

    async fn save_spec(
        &self,
        kind: SourceKind,
        locator: &str,
        hash: String,
        config: ApiConfig,
        created_by: Option<Uuid>,
    ) -> Result<Specification> {
        let version = match config.version.as_deref() {
            Some(declared) => Version::parse(declared)?,
            None => Version::default(),
        };

        let spec = Specification::new(
            config.name.clone(),
            version,
            kind,
            locator,
            hash,
            config,
            created_by,
        )?;
        self.store.save(spec).await
    }

    async fn finish(
        &self,
        kind: SourceKind,
        locator: &str,
        staged: Result<Staged>,
    ) -> IngestionResult {
        match staged {
            Ok(Staged::Duplicate(existing)) => {
                tracing::debug!(source = %locator, hash = %existing.content_hash, "content hash hit");
                self.observer.report(IngestEvent::DuplicateSkipped {
                    locator: locator.to_string(),
                    existing_id: existing.id,
                });
                IngestionResult::new(
                    kind,
                    locator,
                    IngestionStatus::Success,
                    0,
                    vec![existing.id],
                    Some(format!("{} already ingested (no changes detected)", kind_label(kind))),
                )
            }
            Ok(Staged::Saved(spec)) => {
                self.observer.report(IngestEvent::SpecSaved {
                    locator: locator.to_string(),
                    spec_id: spec.id,
                    name: spec.name.clone(),
                    version: spec.version.to_string(),
                });

                let summary = summary_text(&spec);
                if let Err(e) = self.indexer.index(&spec, &summary).await {
                    self.observer.report(IngestEvent::IndexFailed {
                        locator: locator.to_string(),
                        error: e.to_string(),
                    });
                }

                let result = IngestionResult::new(
                    kind,
                    locator,
                    IngestionStatus::Success,
                    1,
                    vec![spec.id],
                    None,
                );
                self.record(result).await
            }
            Err(e) => {
                self.observer.report(IngestEvent::SourceFailed {
                    locator: locator.to_string(),
                    error: e.to_string(),
                });
                self.record(IngestionResult::failed(kind, locator, e.to_string()))
                    .await
            }
        }
    }

    /// Append `result` to the audit history; a storage failure is logged
    /// and the unsaved result is returned as-is.
    async fn record(&self, result: IngestionResult) -> IngestionResult {
        match self.store.save_ingestion_result(result.clone()).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(source = %result.source_path, error = %e, "failed to record ingestion result");
                result
            }
        }
    }
}

fn kind_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Postman => "Collection",
        _ => "File",
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "ingestion panicked".to_string()
    }
}

/// Fold per-file outcomes (already in sorted order) into one result.
fn aggregate(root: &str, outcomes: &[(PathBuf, FileOutcome)]) -> IngestionResult {
    let mut apis_ingested = 0;
    let mut api_ids = Vec::new();
    let mut errors = Vec::new();
    let mut finished = 0usize;
    let mut succeeded = 0usize;
    let mut skipped = 0usize;

    for (path, outcome) in outcomes {
        match outcome {
            FileOutcome::Finished(result) => {
                finished += 1;
                if result.is_successful() {
                    succeeded += 1;
                }
                apis_ingested += result.apis_ingested;
                api_ids.extend(result.api_ids.iter().copied());
                if let Some(msg) = &result.error_message {
                    errors.push(format!("{}: {}", file_label(path), msg));
                }
            }
            FileOutcome::Crashed(msg) => errors.push(format!("{}: {}", file_label(path), msg)),
            FileOutcome::Skipped => skipped += 1,
        }
    }

    if skipped > 0 {
        errors.push(format!(
            "cancelled after {} of {} files",
            outcomes.len() - skipped,
            outcomes.len()
        ));
    }

    let status = if finished == 0 || succeeded == 0 {
        IngestionStatus::Failed
    } else if succeeded == finished {
        IngestionStatus::Success
    } else {
        IngestionStatus::Partial
    };

    let message = (!errors.is_empty()).then(|| errors.join("; "));
    IngestionResult::new(SourceKind::File, root, status, apis_ingested, api_ids, message)
}
