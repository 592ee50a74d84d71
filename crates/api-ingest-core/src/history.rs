//! Aggregate statistics over the ingestion audit history.

use serde::Serialize;

use crate::models::{IngestionResult, IngestionStatus};

/// Counts over a window of ingestion results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionSummary {
    pub total_ingestions: usize,
    pub successful: usize,
    pub failed: usize,
    pub partial: usize,
    pub total_apis_ingested: u64,
    /// Percentage of successful results, `0.0` for an empty window.
    pub success_rate: f64,
}

impl IngestionSummary {
    pub fn from_results(results: &[IngestionResult]) -> Self {
        let mut summary = Self {
            total_ingestions: results.len(),
            ..Default::default()
        };

        for result in results {
            match result.status {
                IngestionStatus::Success => summary.successful += 1,
                IngestionStatus::Failed => summary.failed += 1,
                IngestionStatus::Partial => summary.partial += 1,
            }
            summary.total_apis_ingested += result.apis_ingested;
        }

        if summary.total_ingestions > 0 {
            summary.success_rate =
                summary.successful as f64 / summary.total_ingestions as f64 * 100.0;
        }
        summary
    }
}
