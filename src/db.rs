//! SQLite connection pool.
//!
//! Folder ingestion runs up to `ingest.workers` files at once and each of
//! them writes a spec and an audit row, so the pool is sized from the worker
//! count and writers wait on the lock instead of failing with `SQLITE_BUSY`.
//! WAL mode lets the duplicate lookups of other workers proceed meanwhile.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

/// How long a writer waits for the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pool on the configured database, creating the file and its parent
/// directories on first use.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;
    ensure_parent(db_path)?;

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .with_context(|| format!("Invalid database path: {}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(pool_size(config.ingest.workers))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}

/// One connection per worker plus one for the folder-level audit write.
fn pool_size(workers: usize) -> u32 {
    u32::try_from(workers.max(1)).unwrap_or(u32::MAX).saturating_add(1)
}

fn ensure_parent(db_path: &Path) -> Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pool_tracks_worker_count() {
        assert_eq!(pool_size(0), 2);
        assert_eq!(pool_size(4), 5);
    }

    #[tokio::test]
    async fn creates_nested_database_in_wal_mode() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("data/nested/apingest.sqlite");
        let config: Config = toml::from_str(&format!(
            "[db]\npath = \"{}\"\n",
            db.display().to_string().replace('\\', "/")
        ))
        .unwrap();

        let pool = connect(&config).await.unwrap();
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        pool.close().await;

        assert_eq!(mode.to_lowercase(), "wal");
        assert!(db.exists());
    }
}
