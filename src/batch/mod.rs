//! Batch scheduler.
//!
//! Splits the ordered comments of a whole pull request into reviews that
//! respect the platform's per-review comment limit, and titles them.

use crate::constants::MAX_COMMENTS_PER_REVIEW;
use crate::models::{AnchoredComment, Batch};

/// Review titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTitles {
    /// Label for multi-batch submissions, rendered as `"<label> (Part k)"`.
    pub label: String,
    /// Title used when everything fits in one batch.
    pub complete: String,
}

impl Default for BatchTitles {
    fn default() -> Self {
        Self {
            label: "AI Code Review".to_string(),
            complete: "AI Code Review Complete".to_string(),
        }
    }
}

impl BatchTitles {
    fn title(&self, part: usize, total: usize) -> String {
        if total > 1 {
            format!("{} (Part {part})", self.label)
        } else {
            self.complete.clone()
        }
    }
}

/// Partition comments into batches of at most [`MAX_COMMENTS_PER_REVIEW`].
///
/// An empty input yields no batches; the caller reports "no issues" instead.
pub fn schedule(comments: Vec<AnchoredComment>, titles: &BatchTitles) -> Vec<Batch> {
    schedule_with_size(comments, titles, MAX_COMMENTS_PER_REVIEW)
}

fn schedule_with_size(
    comments: Vec<AnchoredComment>,
    titles: &BatchTitles,
    size: usize,
) -> Vec<Batch> {
    let size = size.max(1);
    let total = comments.len().div_ceil(size);
    let mut batches = Vec::with_capacity(total);
    let mut rest = comments.into_iter().peekable();

    while rest.peek().is_some() {
        let part = batches.len() + 1;
        batches.push(Batch {
            part,
            title: titles.title(part, total),
            comments: rest.by_ref().take(size).collect(),
        });
    }

    tracing::debug!(batches = batches.len(), "scheduled review batches");
    batches
}
