//! Git CLI wrapper for producing diffs.
//!
//! Shells out to `git` via `tokio::process::Command`.

use std::path::Path;

use super::DiffError;

/// Run `git diff <base_ref>` and return the unified diff output.
pub async fn git_diff(repo_root: &Path, base_ref: &str) -> Result<String, DiffError> {
    let stdout = run_git(repo_root, &["diff", "--src-prefix=a/", "--dst-prefix=b/", base_ref])
        .await
        .map_err(|stderr| DiffError::GitError(format!("git diff failed: {stderr}")))?;

    String::from_utf8(stdout)
        .map_err(|e| DiffError::InvalidInput(format!("git output is not valid UTF-8: {e}")))
}

/// Find the root of the git repository containing `start_dir`.
pub async fn find_repo_root(start_dir: &Path) -> Result<String, DiffError> {
    let stdout = run_git(start_dir, &["rev-parse", "--show-toplevel"])
        .await
        .map_err(|stderr| DiffError::GitError(format!("not a git repository: {stderr}")))?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}

/// Run git and return stdout, or a description of what went wrong.
async fn run_git(dir: &Path, args: &[&str]) -> Result<Vec<u8>, String> {
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| format!("failed to run git: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("exit {}: {}", output.status, stderr.trim()));
    }
    Ok(output.stdout)
}
