//! Ordered, resumable submission of review batches and status notes.
//!
//! Batches are submitted strictly in order. Submission stops at the first
//! failing batch and reports its part number, so the same outcome can be
//! resubmitted starting from that part without recomputing anything.

use async_trait::async_trait;
use thiserror::Error;

use crate::constants::{FAILED_NOTE_HINT, NO_ISSUES_NOTE, STARTED_NOTE};
use crate::models::Batch;
use crate::orchestrator::ReviewOutcome;
use crate::output::github::GithubError;

/// Errors from submitting a review.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("failed to submit review part {part}: {source}")]
    Batch {
        part: usize,
        #[source]
        source: GithubError,
    },

    #[error("failed to post status note: {source}")]
    Note {
        #[source]
        source: GithubError,
    },
}

impl SubmitError {
    /// The part to resume from, when a batch failed.
    pub fn failed_part(&self) -> Option<usize> {
        match self {
            SubmitError::Batch { part, .. } => Some(*part),
            SubmitError::Note { .. } => None,
        }
    }
}

/// Platform client that accepts reviews and plain comments on one pull request.
#[async_trait]
pub trait ReviewSubmitter: Send + Sync {
    /// Submit one batch as a review with inline comments.
    async fn create_review(&self, batch: &Batch, commit_sha: &str) -> Result<(), GithubError>;

    /// Post a top-level comment on the pull request.
    async fn create_issue_comment(&self, body: &str) -> Result<(), GithubError>;
}

/// What was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// Parts submitted, in order.
    pub submitted_parts: Vec<usize>,
    /// Whether the no-issues note was posted.
    pub posted_no_issues_note: bool,
}

/// Submit an outcome, starting at `from_part` (1-based).
///
/// `NoIssues` posts the success note when `notes` is set. Parts before
/// `from_part` are assumed to be already submitted.
pub async fn submit_outcome(
    submitter: &dyn ReviewSubmitter,
    outcome: &ReviewOutcome,
    commit_sha: &str,
    from_part: usize,
    notes: bool,
) -> Result<SubmitReport, SubmitError> {
    let mut report = SubmitReport::default();

    let batches = match outcome {
        ReviewOutcome::NoIssues => {
            if notes {
                submitter
                    .create_issue_comment(NO_ISSUES_NOTE)
                    .await
                    .map_err(|source| SubmitError::Note { source })?;
                report.posted_no_issues_note = true;
            }
            return Ok(report);
        }
        ReviewOutcome::Review { batches } => batches,
    };

    let from_part = from_part.max(1);
    if from_part > batches.len() {
        tracing::warn!(
            from_part,
            batches = batches.len(),
            "resume point is past the last batch; nothing to submit"
        );
    }

    for batch in batches.iter().filter(|b| b.part >= from_part) {
        submitter
            .create_review(batch, commit_sha)
            .await
            .map_err(|source| SubmitError::Batch {
                part: batch.part,
                source,
            })?;
        tracing::info!(part = batch.part, comments = batch.len(), "submitted review");
        report.submitted_parts.push(batch.part);
    }

    Ok(report)
}

/// Post the "review started" note.
pub async fn post_started_note(submitter: &dyn ReviewSubmitter) -> Result<(), SubmitError> {
    submitter
        .create_issue_comment(STARTED_NOTE)
        .await
        .map_err(|source| SubmitError::Note { source })
}

/// Post the started note, falling back to the failure note if that fails.
///
/// The original error is returned either way; a failing failure note is
/// only logged.
pub async fn announce_start(submitter: &dyn ReviewSubmitter) -> Result<(), SubmitError> {
    let Err(err) = post_started_note(submitter).await else {
        return Ok(());
    };
    if let Err(note_err) = post_failure_note(submitter, &err).await {
        tracing::warn!(error = %note_err, "could not post failure note");
    }
    Err(err)
}

/// Post a note that processing failed.
pub async fn post_failure_note(
    submitter: &dyn ReviewSubmitter,
    error: &dyn std::fmt::Display,
) -> Result<(), SubmitError> {
    submitter
        .create_issue_comment(&failure_note(error))
        .await
        .map_err(|source| SubmitError::Note { source })
}

/// Body of the failure note.
pub fn failure_note(error: &dyn std::fmt::Display) -> String {
    format!("AI Code Review failed: {error}\n\n{FAILED_NOTE_HINT}")
}
