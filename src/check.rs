//! `apingest check <name> <version> <path>`: change detection without
//! ingesting.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use api_ingest_core::change::{content_hash, ChangeDetector};
use api_ingest_core::Version;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub version: String,
    pub content_hash: String,
    pub changed: bool,
    pub existing_id: Option<Uuid>,
    pub existing_hash: Option<String>,
}

pub async fn check(config: &Config, name: &str, version: &str, path: &Path) -> Result<CheckReport> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    // Stored versions are canonical ("1.2" is kept as "1.2.0").
    let version = Version::parse(version)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| version.to_string());

    let pool = db::connect(config).await?;
    let detector = ChangeDetector::new(Arc::new(SqliteStore::new(pool.clone())));
    let outcome = detector.has_changed(name, &version, &content).await;
    pool.close().await;
    let outcome = outcome?;

    Ok(CheckReport {
        name: name.to_string(),
        version,
        content_hash: content_hash(&content),
        changed: outcome.changed,
        existing_id: outcome.existing.as_ref().map(|s| s.id),
        existing_hash: outcome.existing.map(|s| s.content_hash),
    })
}

pub async fn run_check(config: &Config, name: &str, version: &str, path: &Path) -> Result<()> {
    let report = check(config, name, version, path).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
