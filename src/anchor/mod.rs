//! Comment anchor resolver.
//!
//! A purely structural transform from validated annotations to review
//! comments. Line numbers are taken as given; nothing is renumbered.

use crate::models::{Anchor, AnchoredComment, Side, ValidatedAnnotation};

/// Render the comment body: bold severity, message, and a suggestion block.
///
/// The suggestion is inserted verbatim inside the fence.
pub fn format_body(annotation: &ValidatedAnnotation) -> String {
    format!(
        "**{}**: {}\n\n```suggestion\n{}\n```",
        annotation.severity.to_uppercase(),
        annotation.message,
        annotation.suggestion
    )
}

/// Anchor a single annotation on `path`.
pub fn resolve(annotation: &ValidatedAnnotation, path: &str) -> AnchoredComment {
    let anchor = if annotation.is_single_line() {
        Anchor::Line {
            line: annotation.end_line,
            side: Side::Right,
        }
    } else {
        Anchor::Range {
            start_line: annotation.start_line,
            start_side: Side::Right,
            line: annotation.end_line,
            side: Side::Right,
        }
    };

    AnchoredComment {
        path: path.to_string(),
        body: format_body(annotation),
        anchor,
    }
}

/// Anchor every annotation for one file, preserving order.
pub fn resolve_all(annotations: &[ValidatedAnnotation], path: &str) -> Vec<AnchoredComment> {
    annotations.iter().map(|a| resolve(a, path)).collect()
}
