//! Diff engine: input acquisition, multi-file splitting, and the hunk line mapper.

pub mod file;
pub mod git;
pub mod line_map;
pub mod parser;

use std::path::Path;
use thiserror::Error;

use crate::models::{FilePatch, InputMode};

pub use line_map::LineMap;

/// Errors from the diff engine.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("git command failed: {0}")]
    GitError(String),

    #[error("failed to read diff: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The input cannot be scanned at all (e.g. it is not text).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Read a unified diff from stdin.
pub async fn read_diff_stdin() -> Result<String, DiffError> {
    use tokio::io::AsyncReadExt;
    let mut buf = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut buf)
        .await
        .map_err(DiffError::FileReadError)?;
    String::from_utf8(buf)
        .map_err(|_| DiffError::InvalidInput("stdin is not a text diff".to_string()))
}

/// Produce the per-file patches for a local input mode.
///
/// Pull-request input is fetched from GitHub by the caller; passing
/// [`InputMode::PullRequest`] here is an error.
pub async fn get_patches(input: &InputMode, repo_root: &Path) -> Result<Vec<FilePatch>, DiffError> {
    let content = match input {
        InputMode::DiffFile(path) => file::read_diff_file(path).await?,
        InputMode::Stdin => read_diff_stdin().await?,
        InputMode::GitBase(base_ref) => git::git_diff(repo_root, base_ref).await?,
        InputMode::PullRequest(number) => {
            return Err(DiffError::InvalidInput(format!(
                "pull request #{number} must be fetched from GitHub"
            )));
        }
    };
    Ok(parser::split_unified_diff(&content))
}
