//! Content hashing and change detection.
//!
//! The content hash is the lowercase hex SHA-256 of the exact bytes handed
//! in: no trimming, no newline normalization. It is the global dedup key.
//! Change detection is keyed by `(name, version)` instead and compares the
//! stored hash against the hash of the candidate content.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::Specification;
use crate::store::SpecStore;

/// Hex SHA-256 of `content`.
///
/// ```rust
/// use api_ingest_core::change::content_hash;
///
/// let h = content_hash("name: pets\n");
/// assert_eq!(h.len(), 64);
/// assert_eq!(h, content_hash(b"name: pets\n"));
/// ```
pub fn content_hash(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    format!("{:x}", hasher.finalize())
}

/// Outcome of a single [`ChangeDetector::has_changed`] check.
#[derive(Debug, Clone)]
pub struct ChangeCheck {
    pub changed: bool,
    pub existing: Option<Specification>,
}

/// One entry of a [`ChangeDetector::find_changed`] batch.
#[derive(Debug, Clone)]
pub struct ChangeReport {
    pub name: String,
    pub version: String,
    pub changed: bool,
    pub existing: Option<Specification>,
}

pub struct ChangeDetector {
    store: Arc<dyn SpecStore>,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn SpecStore>) -> Self {
        Self { store }
    }

    /// Compare `new_content` against the stored `(name, version)` baseline.
    ///
    /// An unseen pair counts as changed with no existing record.
    pub async fn has_changed(
        &self,
        name: &str,
        version: &str,
        new_content: impl AsRef<[u8]>,
    ) -> Result<ChangeCheck> {
        let new_hash = content_hash(new_content);
        let existing = self.store.find_by_name_and_version(name, version).await?;

        let Some(existing) = existing else {
            return Ok(ChangeCheck {
                changed: true,
                existing: None,
            });
        };

        let changed = existing.content_hash != new_hash;
        if changed {
            tracing::info!(api = name, version, "detected changes");
        } else {
            tracing::debug!(api = name, version, "no changes detected");
        }

        Ok(ChangeCheck {
            changed,
            existing: Some(existing),
        })
    }

    /// Check a batch of `(name, version, content)` triples independently.
    ///
    /// A lookup failure on one triple is reported as changed with no
    /// existing record and does not abort the rest of the batch: a failing
    /// store leads to reprocessing, never to a silent skip.
    pub async fn find_changed<C: AsRef<[u8]>>(
        &self,
        batch: &[(String, String, C)],
    ) -> Vec<ChangeReport> {
        let mut reports = Vec::with_capacity(batch.len());

        for (name, version, content) in batch {
            let check = match self.has_changed(name, version, content).await {
                Ok(check) => check,
                Err(e) => {
                    tracing::warn!(api = %name, version = %version, error = %e, "change check failed; treating as changed");
                    ChangeCheck {
                        changed: true,
                        existing: None,
                    }
                }
            };
            reports.push(ChangeReport {
                name: name.clone(),
                version: version.clone(),
                changed: check.changed,
                existing: check.existing,
            });
        }

        reports
    }
}
