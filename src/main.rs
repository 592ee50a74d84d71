//! # API Ingest CLI (`apingest`)
//!
//! ## Usage
//!
//! ```bash
//! apingest --config ./config/apingest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `apingest init` | Create the SQLite database and run schema migrations |
//! | `apingest ingest file <path>` | Ingest one YAML/JSON API config |
//! | `apingest ingest collection <path>` | Ingest a Postman collection export |
//! | `apingest ingest folder [path]` | Ingest every config in a folder |
//! | `apingest check <name> <version> <path>` | Report whether content changed |
//! | `apingest history` | Recent ingestion results |
//! | `apingest summary` | Statistics over the last 100 results |
//! | `apingest list` | Stored specifications, newest first |
//! | `apingest get <id>` | One specification by UUID |
//!
//! Results are printed as JSON on stdout; logs and progress go to stderr.
//! Ingestion commands exit with status 1 when the result is `failed`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use api_ingest::api_ingest_core::models::{IngestionResult, IngestionStatus};
use api_ingest::progress::ProgressMode;
use api_ingest::{check, config, get, ingest, migrate, stats};

/// API Ingest: versioned, deduplicated ingestion of API configurations.
#[derive(Parser)]
#[command(name = "apingest", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/apingest.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Ingest API configurations.
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Check whether content differs from the stored name/version.
    Check {
        name: String,
        version: String,
        path: PathBuf,
    },

    /// Show recent ingestion results, newest first.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Summarize the last 100 ingestion results.
    Summary,

    /// List stored specifications, newest first.
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Retrieve a specification by its UUID.
    Get { id: String },
}

#[derive(Subcommand)]
enum IngestSource {
    /// A flat YAML/JSON API configuration file.
    File { path: PathBuf },

    /// A Postman collection export (JSON).
    Collection { path: PathBuf },

    /// Every `.yaml`, `.yml` and `.json` file in a folder.
    Folder {
        /// Folder to scan. Defaults to `[ingest].root`.
        path: Option<PathBuf>,

        /// Descend into subdirectories.
        #[arg(long)]
        recursive: bool,

        /// Files processed concurrently. Defaults to `[ingest].workers`.
        #[arg(long)]
        workers: Option<usize>,
    },
}

fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_on_failure(result: &IngestionResult) {
    if result.status == IngestionStatus::Failed {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.log.level);

    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { source } => {
            let result = match source {
                IngestSource::File { path } => {
                    ingest::run_ingest_file(&cfg, &path, progress).await?
                }
                IngestSource::Collection { path } => {
                    ingest::run_ingest_collection(&cfg, &path, progress).await?
                }
                IngestSource::Folder {
                    path,
                    recursive,
                    workers,
                } => ingest::run_ingest_folder(&cfg, path, recursive, workers, progress).await?,
            };
            exit_on_failure(&result);
        }
        Commands::Check {
            name,
            version,
            path,
        } => {
            check::run_check(&cfg, &name, &version, &path).await?;
        }
        Commands::History { limit } => {
            stats::run_history(&cfg, limit).await?;
        }
        Commands::Summary => {
            stats::run_summary(&cfg).await?;
        }
        Commands::List { limit, offset } => {
            stats::run_list(&cfg, limit, offset).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
    }

    Ok(())
}
