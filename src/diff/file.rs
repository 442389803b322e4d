//! Read a unified diff from a file.

use std::path::Path;

use super::DiffError;

/// Read a unified diff from a file path.
pub async fn read_diff_file(path: &Path) -> Result<String, DiffError> {
    if !path.exists() {
        return Err(DiffError::PathNotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await.map_err(DiffError::FileReadError)?;
    String::from_utf8(bytes).map_err(|_| {
        DiffError::InvalidInput(format!("{} is not a text diff", path.display()))
    })
}
