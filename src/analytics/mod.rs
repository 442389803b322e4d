//! Per-review analytics record.
//!
//! One record is emitted per review run as a structured `tracing` event on
//! the `suggestbot::analytics` target, so it can be routed to a separate
//! sink with an `EnvFilter` directive without touching the review flow.

use std::time::Duration;

use serde::Serialize;

use crate::orchestrator::ReviewReport;

/// Tracing target for analytics events.
pub const TARGET: &str = "suggestbot::analytics";

/// Aggregate statistics for one review run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    /// Random identifier for this run.
    pub run_id: String,
    pub repository: Option<String>,
    pub pull_number: Option<u64>,
    pub files_reviewed: usize,
    pub issues: usize,
    pub dropped: usize,
    pub unavailable: usize,
    pub batches: usize,
    pub elapsed_ms: u64,
}

impl ReviewRecord {
    /// Build a record from a finished review.
    pub fn from_report(
        report: &ReviewReport,
        repository: Option<&str>,
        pull_number: Option<u64>,
        elapsed: Duration,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            repository: repository.map(str::to_string),
            pull_number,
            files_reviewed: report.files.len(),
            issues: report.outcome.comment_count(),
            dropped: report.dropped,
            unavailable: report.unavailable,
            batches: report.outcome.batches().len(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Emit the record as a single structured event.
pub fn record_review(record: &ReviewRecord) {
    tracing::info!(
        target: TARGET,
        run_id = %record.run_id,
        repository = record.repository.as_deref().unwrap_or(""),
        pull_number = record.pull_number.unwrap_or(0),
        files_reviewed = record.files_reviewed,
        issues = record.issues,
        dropped = record.dropped,
        unavailable = record.unavailable,
        batches = record.batches,
        elapsed_ms = record.elapsed_ms,
        "review recorded"
    );
}
