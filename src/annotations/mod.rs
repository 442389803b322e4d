//! Annotation normalizer.
//!
//! Turns a model's raw text response into validated annotations. Nothing
//! in here fails: an unusable response yields no annotations, and unusable
//! records are filtered out. The counters in [`NormalizeStats`] are the
//! only trace of what was discarded.

pub mod extract;

use serde::Serialize;
use serde_json::Value;

use crate::diff::LineMap;
use crate::models::{RawAnnotation, ValidatedAnnotation};

pub use extract::{ExtractionStrategy, extract_json};

/// Severity used when the model omits one.
pub const DEFAULT_SEVERITY: &str = "info";

/// Message used when the model omits one.
pub const DEFAULT_MESSAGE: &str = "Suggestion";

/// Where the annotations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "strategy")]
pub enum ResponseSource {
    /// JSON was located with the given strategy.
    Extracted(ExtractionStrategy),
    /// No response arrived (provider error or timeout).
    Unavailable,
    /// A response arrived but contained no usable JSON.
    Unparseable,
}

/// Aggregate counters for one normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub source: ResponseSource,
    /// Candidate records found in the payload.
    pub received: usize,
    pub kept: usize,
    pub dropped: usize,
    /// Kept annotations whose range contains no added line.
    pub off_map: usize,
}

impl NormalizeStats {
    fn empty(source: ResponseSource) -> Self {
        Self {
            source,
            received: 0,
            kept: 0,
            dropped: 0,
            off_map: 0,
        }
    }
}

/// Result of normalizing one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    pub annotations: Vec<ValidatedAnnotation>,
    pub stats: NormalizeStats,
}

/// Normalize a model response against the line map of the file under review.
///
/// `None` means the response is unavailable and is handled like a parse
/// failure. The line map does not filter anything; annotations outside the
/// added lines are only counted.
pub fn normalize_response(response: Option<&str>, line_map: &LineMap) -> Normalized {
    let Some(text) = response else {
        return Normalized {
            annotations: Vec::new(),
            stats: NormalizeStats::empty(ResponseSource::Unavailable),
        };
    };

    let Some((payload, strategy)) = extract_json(text) else {
        tracing::warn!(
            response_len = text.len(),
            "model response contained no parseable JSON; treating as no issues"
        );
        return Normalized {
            annotations: Vec::new(),
            stats: NormalizeStats::empty(ResponseSource::Unparseable),
        };
    };

    let records = issue_records(payload);
    let received = records.len();
    let annotations = normalize_records(records);
    let off_map = annotations
        .iter()
        .filter(|a| !line_map.touches_range(a.start_line, a.end_line))
        .count();

    let stats = NormalizeStats {
        source: ResponseSource::Extracted(strategy),
        received,
        kept: annotations.len(),
        dropped: received - annotations.len(),
        off_map,
    };
    tracing::debug!(
        %strategy,
        received = stats.received,
        kept = stats.kept,
        dropped = stats.dropped,
        off_map = stats.off_map,
        "normalized model response"
    );

    Normalized { annotations, stats }
}

/// Validate records in order, dropping those that cannot be used.
pub fn normalize_records(
    records: impl IntoIterator<Item = RawAnnotation>,
) -> Vec<ValidatedAnnotation> {
    records.into_iter().filter_map(validate).collect()
}

/// Validate one record.
///
/// Line bounds come from `start_line`/`end_line` when either is usable (the
/// missing one mirrors the other), otherwise from `line`. Reversed bounds
/// are swapped. A record without a non-blank suggestion or without any
/// usable line reference is dropped.
pub fn validate(raw: RawAnnotation) -> Option<ValidatedAnnotation> {
    let suggestion = raw.suggestion.filter(|s| !s.trim().is_empty())?;

    let line = raw.line.as_ref().and_then(|l| l.as_line_number());
    let start = raw.start_line.as_ref().and_then(|l| l.as_line_number());
    let end = raw.end_line.as_ref().and_then(|l| l.as_line_number());

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, s),
        (None, Some(e)) => (e, e),
        (None, None) => (line?, line?),
    };
    let (start_line, end_line) = if start > end { (end, start) } else { (start, end) };

    Some(ValidatedAnnotation {
        start_line,
        end_line,
        severity: non_blank(raw.severity).unwrap_or_else(|| DEFAULT_SEVERITY.to_string()),
        message: non_blank(raw.message).unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        suggestion,
    })
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|s| !s.trim().is_empty())
}

/// Pull the candidate issue records out of the payload.
///
/// Accepts `{"issues": [...]}` or a bare array. Entries that are not
/// objects, or that fail to deserialize, become empty records so they are
/// counted as received and then dropped.
fn issue_records(payload: Value) -> Vec<RawAnnotation> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("issues") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
            _ => RawAnnotation::default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawLine;
    use pretty_assertions::assert_eq;

    fn map() -> LineMap {
        LineMap::from_patch("@@ -1,2 +1,3 @@\n line1\n+added line\n line2")
    }

    fn raw(json: &str) -> RawAnnotation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn scenario_single_issue() {
        let out = normalize_response(
            Some(r#"{"issues":[{"line":2,"severity":"high","message":"x","suggestion":"fixed"}]}"#),
            &map(),
        );
        assert_eq!(
            out.annotations,
            vec![ValidatedAnnotation {
                start_line: 2,
                end_line: 2,
                severity: "high".into(),
                message: "x".into(),
                suggestion: "fixed".into(),
            }]
        );
        assert_eq!(out.stats.source, ResponseSource::Extracted(ExtractionStrategy::Direct));
        assert_eq!(out.stats.off_map, 0);
    }

    #[test]
    fn prose_and_fence_yield_the_same_annotations() {
        let body = r#"{"issues":[{"start_line":"4","end_line":2,"message":"m","suggestion":"s"}]}"#;
        let prose_text = format!("Sure! Here it is: {body} Hope that helps.");
        let prose = normalize_response(Some(&prose_text), &map());
        let fenced = normalize_response(Some(&format!("```json\n{body}\n```")), &map());
        assert_eq!(prose.annotations, fenced.annotations);
        assert_eq!(prose.stats.source, ResponseSource::Extracted(ExtractionStrategy::Braces));
        assert_eq!(fenced.stats.source, ResponseSource::Extracted(ExtractionStrategy::Fenced));
    }

    #[test]
    fn unavailable_and_unparseable_are_empty() {
        let none = normalize_response(None, &map());
        assert!(none.annotations.is_empty());
        assert_eq!(none.stats.source, ResponseSource::Unavailable);

        let junk = normalize_response(Some("I could not review this file."), &map());
        assert!(junk.annotations.is_empty());
        assert_eq!(junk.stats.source, ResponseSource::Unparseable);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let a = validate(raw(r#"{"start_line":9,"end_line":3,"suggestion":"x"}"#)).unwrap();
        assert_eq!((a.start_line, a.end_line), (3, 9));
    }

    #[test]
    fn one_sided_bounds_mirror() {
        let a = validate(raw(r#"{"start_line":5,"suggestion":"x"}"#)).unwrap();
        assert_eq!((a.start_line, a.end_line), (5, 5));
        let b = validate(raw(r#"{"end_line":"8","suggestion":"x"}"#)).unwrap();
        assert_eq!((b.start_line, b.end_line), (8, 8));
    }

    #[test]
    fn explicit_bounds_win_over_line() {
        let a = validate(raw(r#"{"line":1,"start_line":3,"end_line":4,"suggestion":"x"}"#))
            .unwrap();
        assert_eq!((a.start_line, a.end_line), (3, 4));
    }

    #[test]
    fn records_without_suggestion_or_lines_are_dropped() {
        assert_eq!(validate(raw(r#"{"line":3,"message":"no fix"}"#)), None);
        assert_eq!(validate(raw(r#"{"line":3,"suggestion":"   "}"#)), None);
        assert_eq!(validate(raw(r#"{"message":"m","suggestion":"x"}"#)), None);
        assert_eq!(validate(raw(r#"{"line":"three","suggestion":"x"}"#)), None);
        assert_eq!(validate(raw(r#"{"line":0,"suggestion":"x"}"#)), None);
        assert_eq!(validate(RawAnnotation::default()), None);
    }

    #[test]
    fn defaults_fill_missing_text() {
        let a = validate(raw(r#"{"line":2,"suggestion":"x"}"#)).unwrap();
        assert_eq!(a.severity, DEFAULT_SEVERITY);
        assert_eq!(a.message, DEFAULT_MESSAGE);
    }

    #[test]
    fn suggestion_is_kept_verbatim() {
        let a = validate(raw(r#"{"line":2,"suggestion":"  indented()\n"}"#)).unwrap();
        assert_eq!(a.suggestion, "  indented()\n");
    }

    #[test]
    fn order_is_preserved_and_counts_add_up() {
        let response = r#"[
            {"line": 7, "suggestion": "a"},
            "not an object",
            {"line": 2, "suggestion": ""},
            {"line": 1, "suggestion": "b"},
            {"line": {"bad": true}, "suggestion": "c"}
        ]"#;
        let out = normalize_response(Some(response), &map());
        let lines: Vec<u32> = out.annotations.iter().map(|a| a.start_line).collect();
        assert_eq!(lines, vec![7, 1]);
        assert_eq!(out.stats.received, 5);
        assert_eq!(out.stats.kept, 2);
        assert_eq!(out.stats.dropped, 3);
        assert_eq!(out.stats.off_map, 2);
    }

    #[test]
    fn object_without_issues_key_is_empty() {
        let out = normalize_response(
            Some(r#"{"findings": [{"line": 2, "suggestion": "x"}]}"#),
            &map(),
        );
        assert!(out.annotations.is_empty());
        assert_eq!(out.stats.received, 0);
    }

    #[test]
    fn normalizing_validated_annotations_is_idempotent() {
        let first = normalize_records(vec![
            raw(r#"{"start_line":6,"end_line":2,"severity":"low","message":"m","suggestion":"x"}"#),
            raw(r#"{"line":"4","suggestion":"y"}"#),
        ]);
        let again = normalize_records(first.iter().map(RawAnnotation::from));
        assert_eq!(first, again);
    }

    #[test]
    fn raw_line_from_validated_is_integer() {
        let a = validate(raw(r#"{"line":2.0,"suggestion":"x"}"#)).unwrap();
        assert_eq!(RawAnnotation::from(&a).start_line, Some(RawLine::Int(2)));
    }
}
