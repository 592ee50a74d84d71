//! Core data models used throughout API Ingest.
//!
//! These types represent the canonical API configuration produced by the
//! source transformers, the persisted specification record, and the audit
//! record written for every ingestion invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::version::Version;

/// Where an API configuration was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A flat YAML/JSON file.
    File,
    /// A Postman collection export.
    Postman,
    Git,
    Url,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [Self::File, Self::Postman, Self::Git, Self::Url];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Postman => "postman",
            Self::Git => "git",
            Self::Url => "url",
        }
    }

    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::File | Self::Postman)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Git | Self::Url)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                IngestError::validation(format!(
                    "Invalid source type: {}. Must be one of {:?}",
                    s, valid
                ))
            })
    }
}

/// A single declared endpoint parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

fn default_param_type() -> String {
    "string".to_string()
}

/// Normalized endpoint description, shared by every source format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub name: String,
    /// Always absolute (leading `/`).
    #[serde(default = "root_path")]
    pub path: String,
    /// Uppercased HTTP method.
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<serde_json::Value>,
}

fn root_path() -> String {
    "/".to_string()
}

pub(crate) fn default_method() -> String {
    "GET".to_string()
}

/// Source-agnostic API description produced by a transformer.
///
/// Stored verbatim as the metadata document of a [`Specification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub name: String,
    /// Declared version string, unparsed. `None` when the source declared none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Provenance tag: `"file"` or `"postman"`.
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    /// Top-level fields of a flat file that have no canonical slot.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A persisted, versioned API specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub id: Uuid,
    pub name: String,
    pub version: Version,
    pub source_kind: SourceKind,
    pub source_path: String,
    /// Hex SHA-256 of the raw source bytes; the global dedup key.
    pub content_hash: String,
    pub metadata: ApiConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl Specification {
    /// Build a new record with a fresh id and timestamps.
    ///
    /// # Errors
    ///
    /// [`IngestError::Validation`] when `name`, `source_path` or
    /// `content_hash` is empty.
    pub fn new(
        name: impl Into<String>,
        version: Version,
        source_kind: SourceKind,
        source_path: impl Into<String>,
        content_hash: impl Into<String>,
        metadata: ApiConfig,
        created_by: Option<Uuid>,
    ) -> Result<Self> {
        let name = name.into();
        let source_path = source_path.into();
        let content_hash = content_hash.into();

        if name.trim().is_empty() {
            return Err(IngestError::validation("API name cannot be empty"));
        }
        if source_path.is_empty() {
            return Err(IngestError::validation("Source path cannot be empty"));
        }
        if content_hash.is_empty() {
            return Err(IngestError::validation("Content hash cannot be empty"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            version,
            source_kind,
            source_path,
            content_hash,
            metadata,
            created_at: now,
            updated_at: now,
            created_by,
        })
    }

    pub fn update_metadata(&mut self, metadata: ApiConfig) {
        self.metadata = metadata;
        self.updated_at = Utc::now();
    }

    pub fn update_version(&mut self, version: Version) {
        self.version = version;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Success,
    Failed,
    Partial,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestionStatus {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "partial" => Ok(Self::Partial),
            other => Err(IngestError::validation(format!(
                "Status must be one of [success, failed, partial], got '{}'",
                other
            ))),
        }
    }
}

/// Immutable audit record of one ingestion invocation.
///
/// Fields are public for reading; construct through [`IngestionResult::new`]
/// or the status-specific helpers so `id` and `created_at` are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub id: Uuid,
    pub source_kind: SourceKind,
    pub source_path: String,
    pub status: IngestionStatus,
    pub apis_ingested: u64,
    pub api_ids: Vec<Uuid>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IngestionResult {
    pub fn new(
        source_kind: SourceKind,
        source_path: impl Into<String>,
        status: IngestionStatus,
        apis_ingested: u64,
        api_ids: Vec<Uuid>,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_kind,
            source_path: source_path.into(),
            status,
            apis_ingested,
            api_ids,
            error_message,
            created_at: Utc::now(),
        }
    }

    pub fn failed(
        source_kind: SourceKind,
        source_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            source_kind,
            source_path,
            IngestionStatus::Failed,
            0,
            Vec::new(),
            Some(message.into()),
        )
    }

    pub fn is_successful(&self) -> bool {
        self.status == IngestionStatus::Success
    }

    pub fn has_errors(&self) -> bool {
        self.error_message.is_some()
    }
}
