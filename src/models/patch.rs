//! Per-file patch type.

use serde::{Deserialize, Serialize};

/// The diff of a single changed file, as handed to the annotation pipeline.
///
/// `patch` holds only the hunk text (starting at the first `@@` header),
/// which is the shape the GitHub pull-request files API returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    /// Path of the file on the new side, relative to the repo root.
    pub path: String,
    /// Path on the old side. Differs from `path` for renames.
    pub old_path: String,
    /// Unified-diff hunk text for this file. Empty for binaries and pure renames.
    pub patch: String,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_rename: bool,
    pub is_binary: bool,
}

impl FilePatch {
    /// Build a patch for a modified file with the given hunk text.
    pub fn modified(path: impl Into<String>, patch: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            old_path: path.clone(),
            path,
            patch: patch.into(),
            ..Self::default()
        }
    }

    /// Whether the patch has new-side lines that can carry inline comments.
    pub fn is_reviewable(&self) -> bool {
        !self.is_binary && !self.is_deleted && !self.patch.trim().is_empty()
    }

    /// Lowercased file extension of `path`, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.path.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}
