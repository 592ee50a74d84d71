//! # API Ingest
//!
//! Ingests API configurations (flat YAML/JSON files and Postman collection
//! exports) into a versioned, deduplicated SQLite catalogue with an audit
//! trail of every ingestion run.
//!
//! The ingestion logic itself lives in [`api_ingest_core`]; this crate
//! supplies the concrete collaborators and the `apingest` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │  LocalFs    │──▶│  IngestPipeline  │──▶│ SqliteStore  │
//! │ walk + read │   │ hash, parse, save│   │ specs+results│
//! └─────────────┘   └────────┬─────────┘   └──────────────┘
//!                            │ best effort
//!                            ▼
//!                    ┌──────────────┐
//!                    │ OpenAiIndexer│
//!                    │ embeddings   │
//!                    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! apingest init
//! apingest ingest file ./api_configs/pets.yaml
//! apingest ingest collection ./exports/orders.postman_collection.json
//! apingest ingest folder ./api_configs --recursive --workers 8
//! apingest summary
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite [`SpecStore`](api_ingest_core::store::SpecStore) |
//! | [`connector_fs`] | Local filesystem reader |
//! | [`indexer`] | Embedding-backed indexers |
//! | [`progress`] | stderr progress reporting |
//! | [`ingest`] | `ingest` commands |
//! | [`check`] | `check` command |
//! | [`get`] | `get` command |
//! | [`stats`] | `history`, `summary`, `list` commands |

pub mod check;
pub mod config;
pub mod connector_fs;
pub mod db;
pub mod get;
pub mod indexer;
pub mod ingest;
pub mod migrate;
pub mod progress;
pub mod sqlite_store;
pub mod stats;

pub use api_ingest_core;
