//! Read-only history commands: `history`, `summary` and `list`.
//!
//! All output is pretty JSON on stdout.

use anyhow::Result;
use serde::Serialize;

use api_ingest_core::history::IngestionSummary;
use api_ingest_core::store::SpecStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Number of recent results the `summary` command aggregates over.
pub const SUMMARY_WINDOW: usize = 100;

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub database: String,
    pub size_bytes: u64,
    pub specifications: i64,
    pub embedded: i64,
    /// Statistics over the last [`SUMMARY_WINDOW`] ingestion results.
    pub recent: IngestionSummary,
}

pub async fn summary(config: &Config) -> Result<SummaryReport> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let specifications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_specifications")
        .fetch_one(&pool)
        .await?;
    let embedded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spec_embeddings")
        .fetch_one(&pool)
        .await?;
    let results = store.recent_ingestions(SUMMARY_WINDOW).await?;
    pool.close().await;

    let size_bytes = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(SummaryReport {
        database: config.db.path.display().to_string(),
        size_bytes,
        specifications,
        embedded,
        recent: IngestionSummary::from_results(&results),
    })
}

pub async fn run_summary(config: &Config) -> Result<()> {
    let report = summary(config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn run_history(config: &Config, limit: usize) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let results = store.recent_ingestions(limit).await?;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

pub async fn run_list(config: &Config, limit: usize, offset: usize) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let specs = store.list(limit, offset).await?;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}
