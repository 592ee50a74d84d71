//! Specification retrieval by ID (`apingest get <id>`).

use anyhow::{bail, Context, Result};
use serde::Serialize;
use uuid::Uuid;

use api_ingest_core::models::Specification;
use api_ingest_core::store::SpecStore;

use crate::config::Config;
use crate::db;
use crate::indexer::stored_embedding;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingInfo {
    pub model: String,
    pub dims: usize,
}

/// A specification plus its embedding status.
#[derive(Debug, Clone, Serialize)]
pub struct SpecResponse {
    #[serde(flatten)]
    pub spec: Specification,
    pub embedding: Option<EmbeddingInfo>,
}

pub async fn get_spec(config: &Config, id: &str) -> Result<SpecResponse> {
    let id = Uuid::parse_str(id).with_context(|| format!("invalid specification id: {}", id))?;

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let spec = match store.find_by_id(id).await? {
        Some(spec) => spec,
        None => {
            pool.close().await;
            bail!("specification not found: {}", id);
        }
    };

    let embedding = stored_embedding(&pool, id)
        .await?
        .map(|(model, vector)| EmbeddingInfo {
            model,
            dims: vector.len(),
        });

    pool.close().await;
    Ok(SpecResponse { spec, embedding })
}

/// CLI entry point: prints the specification as pretty JSON.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let response = match get_spec(config, id).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
