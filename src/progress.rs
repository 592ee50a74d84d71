//! Ingestion progress reporting for the CLI.
//!
//! Progress goes to **stderr** so stdout stays parseable JSON. Two
//! reporters are provided on top of the core [`IngestObserver`] trait:
//! a human one-line-per-event format and newline-delimited JSON.

use std::io::{IsTerminal, Write};

use api_ingest_core::observer::{IngestEvent, IngestObserver};

/// Human-friendly progress: `ingest pets.yaml  3 / 12 files  success`.
pub struct StderrProgress;

impl IngestObserver for StderrProgress {
    fn report(&self, event: IngestEvent) {
        let line = match &event {
            IngestEvent::FolderDiscovered { root, files } => {
                format!("ingest {}  found {} files\n", root, format_number(*files as u64))
            }
            IngestEvent::FolderProgress {
                file,
                status,
                n,
                total,
            } => format!(
                "ingest {}  {} / {} files  {}\n",
                file,
                format_number(*n as u64),
                format_number(*total as u64),
                status
            ),
            IngestEvent::FolderCancelled { processed, total } => {
                format!("ingest cancelled after {} of {} files\n", processed, total)
            }
            IngestEvent::IndexFailed { locator, error } => {
                format!("ingest {}  indexing skipped: {}\n", locator, error)
            }
            _ => return,
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IngestObserver for JsonProgress {
    fn report(&self, event: IngestEvent) {
        let obj = match &event {
            IngestEvent::FolderDiscovered { root, files } => serde_json::json!({
                "event": "discovered",
                "root": root,
                "files": files,
            }),
            IngestEvent::FolderProgress {
                file,
                status,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "file": file,
                "status": status.as_str(),
                "n": n,
                "total": total,
            }),
            IngestEvent::FolderCancelled { processed, total } => serde_json::json!({
                "event": "cancelled",
                "processed": processed,
                "total": total,
            }),
            _ => return,
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IngestObserver for NoProgress {
    fn report(&self, _event: IngestEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a terminal, otherwise off.
    pub fn default_for_tty() -> Self {
        if std::io::stderr().is_terminal() {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn observer(&self) -> Box<dyn IngestObserver> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
