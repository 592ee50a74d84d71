//! SQLite-backed [`SpecStore`] implementation.
//!
//! Specifications live in `api_specifications`, audit records in
//! `ingestion_results`. `UNIQUE(content_hash)` makes a racing duplicate
//! save fail rather than create a second record. Timestamps are stored as
//! Unix microseconds so "newest first" listings stay stable for records
//! written within the same second.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use api_ingest_core::error::{IngestError, Result};
use api_ingest_core::models::{ApiConfig, IngestionResult, IngestionStatus, SourceKind, Specification};
use api_ingest_core::store::SpecStore;
use api_ingest_core::Version;

const SPEC_COLUMNS: &str = "id, name, version, source_type, source_path, content_hash, \
                            metadata_json, created_at, updated_at, created_by";

const RESULT_COLUMNS: &str =
    "id, source_type, source_path, status, apis_ingested, api_ids, error_message, created_at";

/// SQLite implementation of the [`SpecStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn find_spec_where(&self, clause: &str, value: &str) -> Result<Option<Specification>> {
        let sql = format!(
            "SELECT {} FROM api_specifications WHERE {} LIMIT 1",
            SPEC_COLUMNS, clause
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(IngestError::storage)?;
        row.as_ref().map(spec_from_row).transpose()
    }
}

fn to_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(us: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us)
        .ok_or_else(|| IngestError::storage(format!("timestamp out of range: {}", us)))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| IngestError::storage(format!("bad id '{}': {}", raw, e)))
}

fn spec_from_row(row: &SqliteRow) -> Result<Specification> {
    let id: String = row.get("id");
    let version: String = row.get("version");
    let source_type: String = row.get("source_type");
    let metadata_json: String = row.get("metadata_json");
    let created_by: Option<String> = row.get("created_by");

    let metadata: ApiConfig = serde_json::from_str(&metadata_json)
        .map_err(|e| IngestError::storage(format!("bad metadata for {}: {}", id, e)))?;

    Ok(Specification {
        id: parse_uuid(&id)?,
        name: row.get("name"),
        version: Version::parse(&version).map_err(IngestError::storage)?,
        source_kind: source_type.parse::<SourceKind>().map_err(IngestError::storage)?,
        source_path: row.get("source_path"),
        content_hash: row.get("content_hash"),
        metadata,
        created_at: from_micros(row.get("created_at"))?,
        updated_at: from_micros(row.get("updated_at"))?,
        created_by: created_by.as_deref().map(parse_uuid).transpose()?,
    })
}

fn result_from_row(row: &SqliteRow) -> Result<IngestionResult> {
    let id: String = row.get("id");
    let source_type: String = row.get("source_type");
    let status: String = row.get("status");
    let api_ids_json: String = row.get("api_ids");
    let apis_ingested: i64 = row.get("apis_ingested");

    let api_ids: Vec<Uuid> = serde_json::from_str(&api_ids_json)
        .map_err(|e| IngestError::storage(format!("bad api_ids for {}: {}", id, e)))?;

    Ok(IngestionResult {
        id: parse_uuid(&id)?,
        source_kind: source_type.parse::<SourceKind>().map_err(IngestError::storage)?,
        source_path: row.get("source_path"),
        status: status.parse::<IngestionStatus>().map_err(IngestError::storage)?,
        apis_ingested: apis_ingested.max(0) as u64,
        api_ids,
        error_message: row.get("error_message"),
        created_at: from_micros(row.get("created_at"))?,
    })
}

#[async_trait]
impl SpecStore for SqliteStore {
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Specification>> {
        self.find_spec_where("content_hash = ?", content_hash).await
    }

    async fn find_by_name_and_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<Specification>> {
        let sql = format!(
            "SELECT {} FROM api_specifications WHERE name = ? AND version = ? \
             ORDER BY created_at DESC LIMIT 1",
            SPEC_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(version)
            .fetch_optional(&self.pool)
            .await
            .map_err(IngestError::storage)?;
        row.as_ref().map(spec_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Specification>> {
        self.find_spec_where("id = ?", &id.to_string()).await
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Specification>> {
        let sql = format!(
            "SELECT {} FROM api_specifications ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            SPEC_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(IngestError::storage)?;
        rows.iter().map(spec_from_row).collect()
    }

    async fn save(&self, spec: Specification) -> Result<Specification> {
        let metadata_json = serde_json::to_string(&spec.metadata)
            .map_err(|e| IngestError::storage(format!("cannot encode metadata: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO api_specifications (id, name, version, source_type, source_path,
                                            content_hash, metadata_json, created_at,
                                            updated_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(spec.id.to_string())
        .bind(&spec.name)
        .bind(spec.version.to_string())
        .bind(spec.source_kind.as_str())
        .bind(&spec.source_path)
        .bind(&spec.content_hash)
        .bind(&metadata_json)
        .bind(to_micros(&spec.created_at))
        .bind(to_micros(&spec.updated_at))
        .bind(spec.created_by.map(|u| u.to_string()))
        .execute(&self.pool)
        .await
        .map_err(IngestError::storage)?;

        Ok(spec)
    }

    async fn save_ingestion_result(&self, result: IngestionResult) -> Result<IngestionResult> {
        let api_ids = serde_json::to_string(&result.api_ids)
            .map_err(|e| IngestError::storage(format!("cannot encode api_ids: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO ingestion_results (id, source_type, source_path, status,
                                           apis_ingested, api_ids, error_message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(result.id.to_string())
        .bind(result.source_kind.as_str())
        .bind(&result.source_path)
        .bind(result.status.as_str())
        .bind(result.apis_ingested as i64)
        .bind(&api_ids)
        .bind(&result.error_message)
        .bind(to_micros(&result.created_at))
        .execute(&self.pool)
        .await
        .map_err(IngestError::storage)?;

        Ok(result)
    }

    async fn recent_ingestions(&self, limit: usize) -> Result<Vec<IngestionResult>> {
        let sql = format!(
            "SELECT {} FROM ingestion_results ORDER BY created_at DESC, rowid DESC LIMIT ?",
            RESULT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(IngestError::storage)?;
        rows.iter().map(result_from_row).collect()
    }
}
