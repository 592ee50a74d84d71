//! [`SpecIndexer`] implementations backed by an embedding provider.
//!
//! - **[`DisabledIndexer`]**: accepts every spec and stores nothing; used
//!   when `embedding.provider = "disabled"`.
//! - **[`OpenAiIndexer`]**: embeds the spec summary through the OpenAI
//!   embeddings API and upserts the vector into `spec_embeddings`.
//!
//! Vectors are stored as little-endian `f32` BLOBs ([`vec_to_blob`]).
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Every failure surfaces as [`IngestError::Embedding`]; the pipeline logs
//! it and keeps the ingestion successful.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use api_ingest_core::error::{IngestError, Result};
use api_ingest_core::index::SpecIndexer;
use api_ingest_core::models::Specification;

use crate::config::EmbeddingConfig;

/// Build the indexer selected by `config.provider`.
///
/// # Errors
///
/// Unknown provider names, missing `model`/`dims`, or a missing
/// `OPENAI_API_KEY` for the OpenAI provider.
pub fn create_indexer(
    config: &EmbeddingConfig,
    pool: SqlitePool,
) -> anyhow::Result<Arc<dyn SpecIndexer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledIndexer)),
        "openai" => Ok(Arc::new(OpenAiIndexer::new(config, pool)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

pub struct DisabledIndexer;

#[async_trait]
impl SpecIndexer for DisabledIndexer {
    async fn index(&self, spec: &Specification, _summary: &str) -> Result<()> {
        tracing::debug!(spec_id = %spec.id, "embedding disabled, not indexing");
        Ok(())
    }
}

/// Indexer calling `POST {url}` (OpenAI embeddings API by default).
pub struct OpenAiIndexer {
    pool: SqlitePool,
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl OpenAiIndexer {
    pub fn new(config: &EmbeddingConfig, pool: SqlitePool) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            pool,
            client,
            api_key,
            url: config.url.clone(),
            model,
            dims,
            max_retries: config.max_retries,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value =
                            response.json().await.map_err(IngestError::embedding)?;
                        return parse_openai_response(&json)?
                            .into_iter()
                            .next()
                            .ok_or_else(|| IngestError::embedding("Empty embedding response"));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = IngestError::embedding(format!(
                        "OpenAI API error {}: {}",
                        status, body_text
                    ));
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::debug!(attempt, %status, "retryable embedding error");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(IngestError::embedding(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| IngestError::embedding("Embedding failed after retries")))
    }

    async fn store(&self, spec_id: Uuid, vector: &[f32]) -> Result<()> {
        let now = chrono::Utc::now().timestamp_micros();
        sqlx::query(
            r#"
            INSERT INTO spec_embeddings (spec_id, model, dims, embedding, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(spec_id) DO UPDATE SET
                model = excluded.model,
                dims = excluded.dims,
                embedding = excluded.embedding,
                created_at = excluded.created_at
            "#,
        )
        .bind(spec_id.to_string())
        .bind(&self.model)
        .bind(vector.len() as i64)
        .bind(vec_to_blob(vector))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(IngestError::embedding)?;
        Ok(())
    }
}

#[async_trait]
impl SpecIndexer for OpenAiIndexer {
    async fn index(&self, spec: &Specification, summary: &str) -> Result<()> {
        let vector = self.embed(summary).await?;
        if vector.len() != self.dims {
            return Err(IngestError::embedding(format!(
                "expected {} dimensions from {}, got {}",
                self.dims,
                self.model,
                vector.len()
            )));
        }
        self.store(spec.id, &vector).await?;
        tracing::debug!(spec_id = %spec.id, model = %self.model, "stored embedding");
        Ok(())
    }
}

/// Model name and vector for a spec, if one has been stored.
pub async fn stored_embedding(
    pool: &SqlitePool,
    spec_id: Uuid,
) -> anyhow::Result<Option<(String, Vec<f32>)>> {
    let row = sqlx::query("SELECT model, embedding FROM spec_embeddings WHERE spec_id = ?")
        .bind(spec_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| {
        let blob: Vec<u8> = r.get("embedding");
        (r.get("model"), blob_to_vec(&blob))
    }))
}

/// Extract `data[].embedding` arrays, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| IngestError::embedding("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| IngestError::embedding("Invalid OpenAI response: missing embedding"))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .unwrap_or(position as u64);
        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

/// Encode a float vector as little-endian `f32` bytes.
///
/// ```rust
/// use api_ingest::indexer::{blob_to_vec, vec_to_blob};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_vectors_follow_index_order() {
        let json = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.5, 0.25]},
                {"index": 0, "embedding": [1.0, -1.0]}
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![1.0, -1.0], vec![0.5, 0.25]]);
    }

    #[test]
    fn malformed_response_is_an_embedding_error() {
        let err = parse_openai_response(&serde_json::json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, IngestError::Embedding(_)));
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let config = EmbeddingConfig {
            provider: "local".to_string(),
            ..Default::default()
        };
        let pool = sqlx::SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let err = create_indexer(&config, pool).err().unwrap();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }
}
