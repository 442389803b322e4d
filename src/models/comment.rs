//! Anchored review comments and submission batches.

use serde::{Deserialize, Serialize};

/// Which side of the diff a comment endpoint refers to.
///
/// Suggestions always target the new revision, so only `RIGHT` exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[default]
    Right,
}

/// Position of an inline comment in the new revision of a file.
///
/// Serialized with the field names of GitHub's review-comment payload,
/// flattened into the surrounding [`AnchoredComment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    /// Inclusive line range `start_line..=line`.
    Range {
        start_line: u32,
        start_side: Side,
        line: u32,
        side: Side,
    },
    /// A single line.
    Line { line: u32, side: Side },
}

impl Anchor {
    /// First line covered by the anchor.
    pub fn start(&self) -> u32 {
        match *self {
            Anchor::Range { start_line, .. } => start_line,
            Anchor::Line { line, .. } => line,
        }
    }

    /// Last line covered by the anchor.
    pub fn end(&self) -> u32 {
        match *self {
            Anchor::Range { line, .. } | Anchor::Line { line, .. } => line,
        }
    }
}

/// A review comment ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredComment {
    pub path: String,
    pub body: String,
    #[serde(flatten)]
    pub anchor: Anchor,
}

/// An ordered group of comments submitted as one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// 1-based position of this batch within the submission.
    pub part: usize,
    /// Review body shown above the inline comments.
    pub title: String,
    pub comments: Vec<AnchoredComment>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_line_payload_shape() {
        let c = AnchoredComment {
            path: "app.py".into(),
            body: "b".into(),
            anchor: Anchor::Line { line: 7, side: Side::Right },
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"path": "app.py", "body": "b", "line": 7, "side": "RIGHT"})
        );
        assert!(v.get("start_line").is_none());
    }

    #[test]
    fn range_payload_shape() {
        let c = AnchoredComment {
            path: "app.py".into(),
            body: "b".into(),
            anchor: Anchor::Range {
                start_line: 3,
                start_side: Side::Right,
                line: 5,
                side: Side::Right,
            },
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["start_line"], 3);
        assert_eq!(v["line"], 5);
        assert_eq!(v["start_side"], "RIGHT");
        assert_eq!(v["side"], "RIGHT");
    }

    #[test]
    fn payload_deserializes_back_to_the_right_variant() {
        let range: AnchoredComment = serde_json::from_str(
            r#"{"path":"a","body":"b","start_line":1,"start_side":"RIGHT","line":2,"side":"RIGHT"}"#,
        )
        .unwrap();
        assert_eq!(range.anchor.start(), 1);
        assert_eq!(range.anchor.end(), 2);

        let line: AnchoredComment =
            serde_json::from_str(r#"{"path":"a","body":"b","line":9,"side":"RIGHT"}"#).unwrap();
        assert_eq!(line.anchor, Anchor::Line { line: 9, side: Side::Right });
    }
}
