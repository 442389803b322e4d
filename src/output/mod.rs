//! Output renderers: terminal, JSON, and GitHub review payloads.

pub mod github;
pub mod json;
pub mod terminal;

use crate::orchestrator::ReviewReport;

/// Trait for rendering a review report to an output format.
pub trait OutputRenderer {
    /// Render the report to a string.
    fn render(&self, report: &ReviewReport) -> String;
}
