//! Annotation types: untrusted model records and their validated form.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A line reference exactly as the model wrote it.
///
/// Models emit line numbers as integers, floats (`12.0`), numeric strings
/// (`"12"`), or garbage. The variant records which one arrived so that
/// coercion is an explicit step rather than a side effect of parsing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawLine {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawLine {
    /// Coerce to a positive 1-based line number, if the value denotes one.
    pub fn as_line_number(&self) -> Option<u32> {
        match self {
            RawLine::Int(n) => u32::try_from(*n).ok().filter(|&n| n > 0),
            RawLine::Float(f) if f.fract() == 0.0 && *f >= 1.0 && *f <= u32::MAX as f64 => {
                Some(*f as u32)
            }
            RawLine::Float(_) => None,
            RawLine::Text(s) => s.trim().parse::<u32>().ok().filter(|&n| n > 0),
            RawLine::Other(_) => None,
        }
    }
}

impl From<u32> for RawLine {
    fn from(n: u32) -> Self {
        RawLine::Int(i64::from(n))
    }
}

/// One issue record from a model response, before validation.
///
/// Every field is optional. Text fields accept any JSON scalar so that a
/// numeric `message` does not take the whole record down with it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawAnnotation {
    pub line: Option<RawLine>,
    #[serde(alias = "startLine")]
    pub start_line: Option<RawLine>,
    #[serde(alias = "endLine")]
    pub end_line: Option<RawLine>,
    #[serde(deserialize_with = "lenient_text")]
    pub severity: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub suggestion: Option<String>,
}

impl From<&ValidatedAnnotation> for RawAnnotation {
    fn from(a: &ValidatedAnnotation) -> Self {
        Self {
            line: None,
            start_line: Some(a.start_line.into()),
            end_line: Some(a.end_line.into()),
            severity: Some(a.severity.clone()),
            message: Some(a.message.clone()),
            suggestion: Some(a.suggestion.clone()),
        }
    }
}

/// Accept strings, numbers, and booleans as text; everything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// An annotation whose line bounds and suggestion are known to be usable.
///
/// Invariants: `1 <= start_line <= end_line` and `suggestion` is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedAnnotation {
    pub start_line: u32,
    pub end_line: u32,
    /// Free-text severity as reported by the model (`info` when absent).
    pub severity: String,
    pub message: String,
    /// Replacement code for the anchored lines, kept verbatim.
    pub suggestion: String,
}

impl ValidatedAnnotation {
    /// Whether the annotation covers exactly one line.
    pub fn is_single_line(&self) -> bool {
        self.start_line == self.end_line
    }
}

/// Coarse severity bucket used for display and summary counts.
///
/// The annotation itself keeps the model's free-text severity; this is
/// only a classification of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify a free-text severity label.
    ///
    /// Models use many vocabularies ("critical", "error", "minor", "note",
    /// ...). Unrecognised labels fall back to `Medium` rather than failing.
    pub fn classify(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" | "info" | "note" | "suggestion" | "minor" | "trivial" | "style" => {
                Severity::Low
            }
            "high" | "error" | "critical" | "severe" | "blocker" | "fatal" => Severity::High,
            _ => Severity::Medium,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}
