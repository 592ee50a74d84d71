//! # API Ingest Core
//!
//! Storage-agnostic logic for API Ingest: canonical models, version
//! parsing, content hashing and change detection, the Postman collection
//! transform, the flat config parser, collaborator traits, and the
//! ingestion pipeline built on top of them.
//!
//! This crate contains no sqlx, HTTP client, or direct filesystem I/O.
//! Persistence, indexing and file access are injected through traits.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`version`] | Semantic version value type and parser |
//! | [`change`] | SHA-256 content hash and change detection |
//! | [`collection`] | Postman collection → canonical config |
//! | [`flat`] | YAML/JSON flat config parser |
//! | [`schema`] | JSON-schema-like inference from example bodies |
//! | [`models`] | Specifications, configs and ingestion results |
//! | [`store`] | [`SpecStore`](store::SpecStore) trait + in-memory backend |
//! | [`index`] | [`SpecIndexer`](index::SpecIndexer) trait + summary text |
//! | [`source`] | [`SourceReader`](source::SourceReader) trait |
//! | [`observer`] | Pipeline events |
//! | [`ingest`] | Single-source and folder pipeline |
//! | [`history`] | Audit history statistics |

pub mod change;
pub mod collection;
pub mod error;
pub mod flat;
pub mod history;
pub mod index;
pub mod ingest;
pub mod models;
pub mod observer;
pub mod schema;
pub mod source;
pub mod store;
pub mod version;

pub use error::{IngestError, Result};
pub use ingest::{CancelFlag, FolderOptions, IngestPipeline};
pub use version::Version;
