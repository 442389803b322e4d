//! Review orchestrator: per-file concurrency, timeouts, retries, and batching.
//!
//! Each reviewable file is analysed in its own task. Results are put back
//! in file order before scheduling, so batch numbering never depends on
//! which model call finished first.

pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::anchor;
use crate::annotations::{self, NormalizeStats, ResponseSource};
use crate::batch::{self, BatchTitles};
use crate::config::Config;
use crate::diff::LineMap;
use crate::models::{AnchoredComment, Batch, FilePatch, ValidatedAnnotation};
use crate::providers::rig::{
    INITIAL_BACKOFF, MAX_BACKOFF, MAX_RETRIES, classify_error, is_retryable,
};
use crate::providers::{ProviderError, ReviewProvider};

pub use prompt::{SYSTEM_PROMPT, build_prompt};

/// Terminal outcome of a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Nothing to comment on; a success note is posted instead of a review.
    NoIssues,
    /// Ordered batches to submit as separate reviews.
    Review { batches: Vec<Batch> },
}

impl ReviewOutcome {
    /// Schedule comments into an outcome.
    pub fn from_comments(comments: Vec<AnchoredComment>, titles: &BatchTitles) -> Self {
        let batches = batch::schedule(comments, titles);
        if batches.is_empty() {
            ReviewOutcome::NoIssues
        } else {
            ReviewOutcome::Review { batches }
        }
    }

    pub fn batches(&self) -> &[Batch] {
        match self {
            ReviewOutcome::NoIssues => &[],
            ReviewOutcome::Review { batches } => batches,
        }
    }

    pub fn comment_count(&self) -> usize {
        self.batches().iter().map(Batch::len).sum()
    }
}

/// Result of analysing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub annotations: Vec<ValidatedAnnotation>,
    pub comments: Vec<AnchoredComment>,
    pub stats: NormalizeStats,
    /// Why the response was unavailable, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// Report for a file whose model response never arrived.
    pub fn unavailable(path: &str, error: impl Into<String>) -> Self {
        let normalized = annotations::normalize_response(None, &LineMap::default());
        Self {
            path: path.to_string(),
            annotations: normalized.annotations,
            comments: Vec::new(),
            stats: normalized.stats,
            error: Some(error.into()),
        }
    }
}

/// Result of a review run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pub outcome: ReviewOutcome,
    /// Per-file results, in input order.
    pub files: Vec<FileReport>,
    /// Paths that were not sent to the model.
    pub skipped: Vec<String>,
    /// Files whose model response never arrived.
    pub unavailable: usize,
    /// Records discarded by the normalizer across all files.
    pub dropped: usize,
}

/// Retry schedule for transient provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given 0-based attempt, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

/// Run the pure pipeline for one file: map, normalize, anchor.
///
/// `response` is the raw model text, or `None` when it never arrived.
pub fn analyze_patch(path: &str, patch: &str, response: Option<&str>) -> FileReport {
    let line_map = LineMap::from_patch(patch);
    let normalized = annotations::normalize_response(response, &line_map);
    let comments = anchor::resolve_all(&normalized.annotations, path);

    FileReport {
        path: path.to_string(),
        annotations: normalized.annotations,
        comments,
        stats: normalized.stats,
        error: None,
    }
}

/// Orchestrates per-file review across a pull request.
pub struct ReviewOrchestrator {
    provider: Arc<dyn ReviewProvider>,
    config: Config,
    retry: RetryPolicy,
}

impl ReviewOrchestrator {
    pub fn new(provider: Arc<dyn ReviewProvider>, config: &Config) -> Self {
        Self {
            provider,
            config: config.clone(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Review every eligible file and schedule the resulting comments.
    pub async fn run(&self, patches: &[FilePatch]) -> ReviewReport {
        let mut skipped = Vec::new();
        let mut eligible = Vec::new();
        for patch in patches {
            if !patch.is_reviewable() {
                tracing::debug!(path = %patch.path, "skipping file without reviewable changes");
                skipped.push(patch.path.clone());
            } else if !self
                .config
                .review
                .includes_extension(patch.extension().as_deref())
            {
                tracing::debug!(path = %patch.path, "skipping file excluded by extension filter");
                skipped.push(patch.path.clone());
            } else {
                eligible.push(patch);
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.review.max_concurrent.max(1)));
        let timeout_secs = self.config.review.request_timeout_secs;
        let mut join_set = JoinSet::new();

        for (index, patch) in eligible.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let sem = Arc::clone(&semaphore);
            let retry = self.retry;
            let file = (*patch).clone();

            join_set.spawn(async move {
                let path = file.path.as_str();
                let patch_text = file.patch.as_str();
                let line_map = LineMap::from_patch(patch_text);
                let prompt = build_prompt(&file, &line_map);

                let response = match sem.acquire().await {
                    Ok(_permit) => {
                        request_with_retry(provider.as_ref(), &prompt, path, timeout_secs, retry)
                            .await
                    }
                    Err(e) => Err(ProviderError::ApiError(format!("semaphore closed: {e}"))),
                };

                let report = match response {
                    Ok(text) => analyze_patch(path, patch_text, Some(&text)),
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "model response unavailable");
                        FileReport::unavailable(path, e.to_string())
                    }
                };
                (index, report)
            });
        }

        let mut slots: Vec<Option<FileReport>> = vec![None; eligible.len()];
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => tracing::warn!(error = %e, "review task panicked"),
            }
        }

        let files: Vec<FileReport> = slots
            .into_iter()
            .zip(&eligible)
            .map(|(slot, patch)| {
                slot.unwrap_or_else(|| FileReport::unavailable(&patch.path, "review task panicked"))
            })
            .collect();

        for file in &files {
            tracing::info!(
                path = %file.path,
                comments = file.comments.len(),
                dropped = file.stats.dropped,
                "file reviewed"
            );
        }

        let unavailable = files
            .iter()
            .filter(|f| f.stats.source == ResponseSource::Unavailable)
            .count();
        let dropped = files.iter().map(|f| f.stats.dropped).sum();
        let comments: Vec<AnchoredComment> =
            files.iter().flat_map(|f| f.comments.iter().cloned()).collect();
        let outcome = ReviewOutcome::from_comments(comments, &self.config.review.titles());

        tracing::info!(
            files = files.len(),
            skipped = skipped.len(),
            unavailable,
            comments = outcome.comment_count(),
            batches = outcome.batches().len(),
            "review complete"
        );

        ReviewReport {
            outcome,
            files,
            skipped,
            unavailable,
            dropped,
        }
    }
}

/// Call the provider with a timeout, retrying transient failures.
async fn request_with_retry(
    provider: &dyn ReviewProvider,
    prompt: &str,
    path: &str,
    timeout_secs: u64,
    retry: RetryPolicy,
) -> Result<String, ProviderError> {
    let mut attempt = 0;
    loop {
        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            provider.complete(SYSTEM_PROMPT, prompt),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout(timeout_secs)));

        match result {
            Ok(text) => return Ok(text),
            Err(e) if is_retryable(&e) && attempt < retry.max_retries => {
                let backoff = retry.backoff(attempt);
                tracing::warn!(
                    path,
                    attempt = attempt + 1,
                    max = retry.max_retries + 1,
                    reason = classify_error(&e).unwrap_or("Transient error"),
                    backoff_secs = backoff.as_secs(),
                    "retrying model request"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Anchor;

    #[test]
    fn analyze_patch_scenario() {
        let report = analyze_patch(
            "app.py",
            "@@ -1,2 +1,3 @@\n line1\n+added line\n line2",
            Some(r#"{"issues":[{"line":2,"severity":"high","message":"x","suggestion":"fixed"}]}"#),
        );
        assert_eq!(report.annotations.len(), 1);
        assert_eq!(report.comments.len(), 1);
        assert!(matches!(report.comments[0].anchor, Anchor::Line { line: 2, .. }));
    }

    #[test]
    fn analyze_patch_without_response() {
        let report = analyze_patch("app.py", "@@ -1 +1 @@\n+x\n", None);
        assert!(report.comments.is_empty());
        assert_eq!(report.stats.source, ResponseSource::Unavailable);
    }

    #[test]
    fn unavailable_report_is_empty_and_counted() {
        let report = FileReport::unavailable("app.py", "review task panicked");
        assert!(report.annotations.is_empty());
        assert!(report.comments.is_empty());
        assert_eq!(report.stats.source, ResponseSource::Unavailable);
        assert_eq!(report.error.as_deref(), Some("review task panicked"));
    }

    #[test]
    fn huge_hunk_start_does_not_take_down_analysis() {
        let report = analyze_patch(
            "app.py",
            "@@ -1 +4294967295,2 @@\n+a\n+b\n",
            Some(r#"[{"line":4294967295,"suggestion":"a2"}]"#),
        );
        assert_eq!(report.comments.len(), 1);
        assert_eq!(report.stats.off_map, 0);
    }

    #[test]
    fn outcome_from_empty_comments_is_no_issues() {
        let outcome = ReviewOutcome::from_comments(Vec::new(), &BatchTitles::default());
        assert_eq!(outcome, ReviewOutcome::NoIssues);
        assert!(outcome.batches().is_empty());
        assert_eq!(outcome.comment_count(), 0);
    }

    #[test]
    fn retry_policy_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(5));
        assert_eq!(policy.backoff(1), Duration::from_secs(10));
        assert_eq!(policy.backoff(2), Duration::from_secs(20));
        assert_eq!(policy.backoff(10), MAX_BACKOFF);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let v = serde_json::to_value(ReviewOutcome::NoIssues).unwrap();
        assert_eq!(v, serde_json::json!({"status": "no_issues"}));
    }
}
