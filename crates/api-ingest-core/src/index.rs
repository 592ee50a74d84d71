//! Semantic indexing collaborator.
//!
//! After a specification is saved the pipeline hands a short text summary
//! to a [`SpecIndexer`]. Indexing is best-effort: the returned error is
//! logged and dropped by the caller and never changes the ingestion status.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Specification;

#[async_trait]
pub trait SpecIndexer: Send + Sync {
    /// Index `spec` under the given summary text.
    async fn index(&self, spec: &Specification, summary: &str) -> Result<()>;
}

/// Indexer that accepts everything and stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexer;

#[async_trait]
impl SpecIndexer for NoopIndexer {
    async fn index(&self, _spec: &Specification, _summary: &str) -> Result<()> {
        Ok(())
    }
}

/// Text used for embedding: a header block followed by one line per endpoint.
///
/// ```text
/// API Name: Pet Store
/// Version: 1.2.0
/// Description: Pets and owners
/// Endpoint: GET /pets - List pets
/// ```
pub fn summary_text(spec: &Specification) -> String {
    let mut lines = vec![
        format!("API Name: {}", spec.name),
        format!("Version: {}", spec.version),
        format!("Description: {}", spec.metadata.description),
    ];

    for endpoint in &spec.metadata.endpoints {
        let mut line = format!("Endpoint: {} {}", endpoint.method, endpoint.path);
        if !endpoint.description.is_empty() {
            line.push_str(" - ");
            line.push_str(&endpoint.description);
        }
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiConfig, Endpoint, SourceKind};
    use crate::version::Version;
    use std::collections::BTreeMap;

    fn endpoint(method: &str, path: &str, description: &str) -> Endpoint {
        Endpoint {
            name: String::new(),
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
            headers: BTreeMap::new(),
            parameters: Vec::new(),
            request_schema: None,
        }
    }

    #[test]
    fn summary_lists_every_endpoint_in_order() {
        let metadata = ApiConfig {
            name: "Pet Store".to_string(),
            version: Some("1.2".to_string()),
            description: "Pets and owners".to_string(),
            endpoints: vec![
                endpoint("GET", "/pets", "List pets"),
                endpoint("DELETE", "/pets/1", ""),
            ],
            source: "file".to_string(),
            collection_id: None,
            extra: serde_json::Map::new(),
        };
        let spec = Specification::new(
            "Pet Store",
            Version::new(1, 2, 0),
            SourceKind::File,
            "pets.yaml",
            "h",
            metadata,
            None,
        )
        .unwrap();

        assert_eq!(
            summary_text(&spec),
            "API Name: Pet Store\nVersion: 1.2.0\nDescription: Pets and owners\n\
             Endpoint: GET /pets - List pets\nEndpoint: DELETE /pets/1"
        );
    }
}
