//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var`].
//! Tests use [`Env::mock()`] backed by a `HashMap`, so config layering and
//! GitHub settings can be exercised without touching the process environment.

use std::collections::HashMap;

/// Environment variable reader.
#[derive(Clone, Debug, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up an environment variable by name.
    ///
    /// Empty values are reported as absent; CI systems frequently export
    /// variables that are set but blank.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        let value = match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent)?,
            None => std::env::var(name)?,
        };
        if value.trim().is_empty() {
            return Err(std::env::VarError::NotPresent);
        }
        Ok(value)
    }
}
