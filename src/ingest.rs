//! CLI wiring for the ingestion pipeline.
//!
//! Builds an [`IngestPipeline`] over the SQLite store, the local
//! filesystem reader and the configured indexer, runs one ingestion and
//! prints the resulting [`IngestionResult`] as pretty JSON on stdout.
//!
//! Folder runs install a Ctrl-C handler that flips the pipeline's
//! [`CancelFlag`]: files already in flight finish, the rest are skipped
//! and the partial aggregate is still printed and recorded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use api_ingest_core::models::IngestionResult;
use api_ingest_core::observer::{IngestObserver, MultiObserver, TracingObserver};
use api_ingest_core::{CancelFlag, FolderOptions, IngestPipeline};

use crate::config::Config;
use crate::connector_fs::LocalFs;
use crate::db;
use crate::indexer::create_indexer;
use crate::migrate;
use crate::progress::ProgressMode;
use crate::sqlite_store::SqliteStore;

/// Open the database, make sure the schema exists and assemble a pipeline.
pub async fn build_pipeline(
    config: &Config,
    progress: ProgressMode,
) -> Result<(SqlitePool, IngestPipeline)> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let indexer = create_indexer(&config.embedding, pool.clone())?;
    let logs: Arc<dyn IngestObserver> = Arc::new(TracingObserver);
    let human: Arc<dyn IngestObserver> = Arc::from(progress.observer());
    let observer: Arc<dyn IngestObserver> = Arc::new(MultiObserver(vec![logs, human]));

    let pipeline = IngestPipeline::new(store, indexer, Arc::new(LocalFs::new()))
        .with_observer(observer);
    Ok((pool, pipeline))
}

pub async fn run_ingest_file(
    config: &Config,
    path: &Path,
    progress: ProgressMode,
) -> Result<IngestionResult> {
    let (pool, pipeline) = build_pipeline(config, progress).await?;
    let result = pipeline.ingest_file(path, None).await;
    print_result(&result)?;
    pool.close().await;
    Ok(result)
}

pub async fn run_ingest_collection(
    config: &Config,
    path: &Path,
    progress: ProgressMode,
) -> Result<IngestionResult> {
    let (pool, pipeline) = build_pipeline(config, progress).await?;
    let result = pipeline.ingest_collection_file(path, None).await;
    print_result(&result)?;
    pool.close().await;
    Ok(result)
}

/// Ingest a folder. `root`, `recursive` and `workers` fall back to the
/// `[ingest]` section when not given on the command line.
pub async fn run_ingest_folder(
    config: &Config,
    root: Option<PathBuf>,
    recursive: bool,
    workers: Option<usize>,
    progress: ProgressMode,
) -> Result<IngestionResult> {
    let root = root.unwrap_or_else(|| config.ingest.root.clone());
    let workers = workers.unwrap_or(config.ingest.workers);
    if workers == 0 {
        anyhow::bail!("--workers must be >= 1");
    }

    let (pool, pipeline) = build_pipeline(config, progress).await?;

    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing in-flight files");
            flag.cancel();
        }
    });

    let options = FolderOptions {
        recursive: recursive || config.ingest.recursive,
        created_by: None,
        workers,
        cancel: Some(cancel),
    };
    let outcome = pipeline.ingest_folder(&root, &options).await;
    watcher.abort();
    pool.close().await;

    let result = outcome?;
    print_result(&result)?;
    Ok(result)
}

pub fn print_result(result: &IngestionResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
