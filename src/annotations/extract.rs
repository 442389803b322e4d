//! Lenient JSON extraction from model responses.
//!
//! Models are asked for bare JSON but routinely wrap it in markdown fences
//! or surround it with prose. Extraction tries progressively looser
//! strategies and reports which one succeeded.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// How the JSON payload was located in the response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    /// The whole response parsed as JSON.
    Direct,
    /// The contents of a fenced code block parsed as JSON.
    Fenced,
    /// The substring between the first `{` and the last `}` parsed as JSON.
    Braces,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::Direct => write!(f, "direct"),
            ExtractionStrategy::Fenced => write!(f, "fenced"),
            ExtractionStrategy::Braces => write!(f, "braces"),
        }
    }
}

/// Content inside a markdown code fence.
///
/// The closing ``` must start a line so that backticks embedded in JSON
/// string values (a suggestion containing a code block) do not end the match.
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("fence regex is valid")
});

/// Locate and parse the JSON payload in a model response.
///
/// Returns `None` when no strategy yields a JSON object or array.
pub fn extract_json(text: &str) -> Option<(Value, ExtractionStrategy)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(value) = parse_structured(trimmed) {
        return Some((value, ExtractionStrategy::Direct));
    }

    if let Some(inner) = FENCE_RE.captures(trimmed).and_then(|cap| cap.get(1)) {
        if let Some(value) = parse_structured(inner.as_str().trim()) {
            return Some((value, ExtractionStrategy::Fenced));
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(value) = parse_structured(&trimmed[start..=end]) {
                return Some((value, ExtractionStrategy::Braces));
            }
        }
    }

    None
}

/// Parse `candidate`, accepting only objects and arrays.
fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}
