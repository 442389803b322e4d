//! Multi-file unified diff splitter.
//!
//! Splits the output of `git diff` (unified format) into one [`FilePatch`]
//! per changed file. Each patch keeps its hunk text verbatim, starting at
//! the first `@@` header, so it has the same shape as the per-file `patch`
//! field of the GitHub pull-request files API.

use crate::models::FilePatch;

/// Split a unified diff string into per-file patches.
pub fn split_unified_diff(input: &str) -> Vec<FilePatch> {
    let mut files: Vec<FilePatch> = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if !line.starts_with("diff --git ") {
            continue;
        }

        let (old_path, path) = parse_diff_header(line);
        let mut file = FilePatch {
            path,
            old_path,
            ..FilePatch::default()
        };
        let mut in_hunks = false;
        let mut patch = String::new();

        while let Some(&next) = lines.peek() {
            if next.starts_with("diff --git ") {
                break;
            }
            lines.next();

            if in_hunks || next.starts_with("@@") {
                in_hunks = true;
                patch.push_str(next);
                patch.push('\n');
                continue;
            }

            if next.starts_with("new file mode") {
                file.is_new = true;
            } else if next.starts_with("deleted file mode") {
                file.is_deleted = true;
            } else if next.starts_with("rename from") || next.starts_with("rename to") {
                file.is_rename = true;
            } else if next.starts_with("Binary files") || next.starts_with("GIT binary patch") {
                file.is_binary = true;
            }
            // index, similarity, and ---/+++ lines carry nothing we need
        }

        file.patch = patch;
        files.push(file);
    }

    files
}

/// Parse the "diff --git a/path b/path" header line into (old, new) paths.
fn parse_diff_header(line: &str) -> (String, String) {
    let rest = line.strip_prefix("diff --git ").unwrap_or(line);

    if let Some(b_idx) = find_second_prefix(rest) {
        let old_path = strip_diff_prefix(&rest[..b_idx]).to_string();
        let new_path = strip_diff_prefix(&rest[b_idx + 1..]).to_string();
        (old_path, new_path)
    } else {
        let mut parts = rest.splitn(2, ' ');
        let old_path = strip_diff_prefix(parts.next().unwrap_or("")).to_string();
        let new_path = strip_diff_prefix(parts.next().unwrap_or("")).to_string();
        (old_path, new_path)
    }
}

/// Strip a single-character git diff prefix (`a/`, `b/`, or a
/// `diff.mnemonicPrefix` letter: `c/`, `w/`, `i/`, `o/`).
fn strip_diff_prefix(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b'/' && is_prefix_letter(bytes[0]) {
        return &path[2..];
    }
    path
}

/// Position of the space that separates the old and new paths.
///
/// Paths may contain spaces, so split on ` X/` where X is a known prefix.
fn find_second_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len().saturating_sub(2)).find(|&i| {
        bytes[i] == b' ' && bytes[i + 2] == b'/' && is_prefix_letter(bytes[i + 1])
    })
}

fn is_prefix_letter(b: u8) -> bool {
    matches!(b, b'a' | b'b' | b'c' | b'w' | b'i' | b'o')
}
