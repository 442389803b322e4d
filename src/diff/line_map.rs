//! Hunk line mapper.
//!
//! Recovers new-file line numbering from the hunk text of one file's patch.
//! The resulting [`LineMap`] is the addressing scheme for everything that
//! anchors comments: a key is a line number on the new side of the diff,
//! the value is the literal text of the line that was added there.

use std::collections::BTreeMap;

use serde::Serialize;

use super::DiffError;

/// Ordered mapping from new-file line number to added-line content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineMap {
    lines: BTreeMap<u32, String>,
}

/// Cursor and bookkeeping threaded through the scan.
#[derive(Debug, Default)]
struct ScanState {
    cursor: u32,
    /// Set at the first hunk header; `+++`/`---` only count as file headers before it.
    in_hunk: bool,
    /// Numbering ran past `u32::MAX`; nothing is recorded until the next header.
    exhausted: bool,
    lines: BTreeMap<u32, String>,
    malformed_headers: usize,
}

impl ScanState {
    fn step(mut self, line: &str) -> Self {
        if line.starts_with("@@") {
            self.in_hunk = true;
            match new_side_start(line) {
                Some(start) => {
                    self.cursor = start.saturating_sub(1);
                    self.exhausted = false;
                }
                None => self.malformed_headers += 1,
            }
        } else if !self.in_hunk && is_file_header(line) {
            // preamble before the first hunk
        } else if line.starts_with('-') || line.starts_with('\\') {
            // removed lines and "\ No newline at end of file" are not on the new side
        } else if let Some(next) = self.advance() {
            if let Some(added) = line.strip_prefix('+') {
                self.lines.insert(next, added.to_string());
            }
        }
        self
    }

    /// Move the cursor to the next new-side line, if numbering has room.
    fn advance(&mut self) -> Option<u32> {
        if self.exhausted {
            return None;
        }
        match self.cursor.checked_add(1) {
            Some(next) => {
                self.cursor = next;
                Some(next)
            }
            None => {
                self.exhausted = true;
                self.malformed_headers += 1;
                None
            }
        }
    }
}

fn is_file_header(line: &str) -> bool {
    line.starts_with("+++ ") || line == "+++" || line.starts_with("--- ") || line == "---"
}

impl LineMap {
    /// Scan a patch and map every added line to its new-file number.
    ///
    /// Never fails. Empty or malformed input yields an empty or partial map.
    /// A hunk header without a parsable `+N` token leaves the cursor where it
    /// was, so numbering continues from the previous hunk. A hunk whose
    /// numbering would pass `u32::MAX` is cut off at that point.
    pub fn from_patch(patch: &str) -> Self {
        let state = patch
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .fold(ScanState::default(), ScanState::step);

        if state.malformed_headers > 0 {
            tracing::debug!(
                count = state.malformed_headers,
                "malformed hunk headers or numbering overflow; map is partial"
            );
        }

        Self { lines: state.lines }
    }

    /// Scan a patch supplied as raw bytes.
    ///
    /// Returns [`DiffError::InvalidInput`] when the bytes are not UTF-8 text,
    /// the one case the mapper cannot even attempt to scan.
    pub fn from_bytes(patch: &[u8]) -> Result<Self, DiffError> {
        let text = std::str::from_utf8(patch).map_err(|e| {
            DiffError::InvalidInput(format!("patch is not valid UTF-8 text: {e}"))
        })?;
        Ok(Self::from_patch(text))
    }

    /// Content added at `line`, if that line was added.
    pub fn get(&self, line: u32) -> Option<&str> {
        self.lines.get(&line).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Added lines in ascending line order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines.iter().map(|(n, s)| (*n, s.as_str()))
    }

    /// Whether any added line falls inside `start..=end`.
    pub fn touches_range(&self, start: u32, end: u32) -> bool {
        start <= end && self.lines.range(start..=end).next().is_some()
    }

    /// First line number whose added content equals `content`.
    pub fn line_of(&self, content: &str) -> Option<u32> {
        self.lines
            .iter()
            .find(|(_, text)| text.as_str() == content)
            .map(|(n, _)| *n)
    }
}

/// Parse the new-side start line from a hunk header such as
/// `@@ -10,6 +12,8 @@ fn foo()`.
fn new_side_start(header: &str) -> Option<u32> {
    header
        .split_whitespace()
        .skip(1)
        .take_while(|token| !token.starts_with("@@"))
        .find_map(|token| token.strip_prefix('+'))
        .and_then(|range| range.split(',').next())
        .and_then(|start| start.parse().ok())
}
