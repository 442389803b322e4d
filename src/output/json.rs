//! JSON output renderer.
//!
//! Outputs `{"outcome": {...}, "files": [...], "summary": {...}}`.

use serde::Serialize;

use crate::orchestrator::ReviewReport;
use crate::output::OutputRenderer;

/// Aggregate counts for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub skipped: usize,
    pub comments: usize,
    pub batches: usize,
    pub dropped: usize,
    pub unavailable: usize,
}

impl Summary {
    pub fn from_report(report: &ReviewReport) -> Self {
        Self {
            files: report.files.len(),
            skipped: report.skipped.len(),
            comments: report.outcome.comment_count(),
            batches: report.outcome.batches().len(),
            dropped: report.dropped,
            unavailable: report.unavailable,
        }
    }
}

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, report: &ReviewReport) -> String {
        let files: Vec<serde_json::Value> = report
            .files
            .iter()
            .map(|f| {
                serde_json::json!({
                    "path": f.path,
                    "annotations": f.annotations,
                    "stats": f.stats,
                })
            })
            .collect();

        let output = serde_json::json!({
            "outcome": report.outcome,
            "files": files,
            "summary": Summary::from_report(report),
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}
