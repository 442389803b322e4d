//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.suggestbot.toml` in repo root
//! 4. `~/.config/suggestbot/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::batch::BatchTitles;
use crate::constants;
use crate::env::Env;
use crate::models::ProviderName;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub review: ReviewConfig,
    pub github: GithubConfig,
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderName::OpenAI,
            model: "o4-mini".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// Review pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Label for multi-part reviews (`"<title> (Part k)"`).
    pub title: String,
    /// Title of a review that fits in a single batch.
    pub complete_title: String,
    /// File extensions to review, without the dot. Empty reviews everything.
    pub include_extensions: Vec<String>,
    pub max_concurrent: usize,
    pub request_timeout_secs: u64,
    /// Post started / no-issues / failed notes on the pull request.
    pub status_notes: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let titles = BatchTitles::default();
        Self {
            title: titles.label,
            complete_title: titles.complete,
            include_extensions: Vec::new(),
            max_concurrent: 5,
            request_timeout_secs: 120,
            status_notes: true,
        }
    }
}

impl ReviewConfig {
    pub fn titles(&self) -> BatchTitles {
        BatchTitles {
            label: self.title.clone(),
            complete: self.complete_title.clone(),
        }
    }

    /// Whether a file with the given extension should be reviewed.
    pub fn includes_extension(&self, extension: Option<&str>) -> bool {
        if self.include_extensions.is_empty() {
            return true;
        }
        let Some(ext) = extension else {
            return false;
        };
        self.include_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// GitHub submission settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    /// `owner/repo`.
    pub repository: Option<String>,
    pub token: Option<String>,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: constants::GITHUB_API_URL.to_string(),
            repository: None,
            token: None,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: repo-local config
        if let Some(root) = repo_root {
            let local_path = root.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }

        let default_review = ReviewConfig::default();
        if other.review.title != default_review.title {
            self.review.title = other.review.title;
        }
        if other.review.complete_title != default_review.complete_title {
            self.review.complete_title = other.review.complete_title;
        }
        if !other.review.include_extensions.is_empty() {
            self.review.include_extensions = other.review.include_extensions;
        }
        if other.review.max_concurrent != default_review.max_concurrent {
            self.review.max_concurrent = other.review.max_concurrent;
        }
        if other.review.request_timeout_secs != default_review.request_timeout_secs {
            self.review.request_timeout_secs = other.review.request_timeout_secs;
        }
        // disabled overrides enabled
        if !other.review.status_notes {
            self.review.status_notes = false;
        }

        if other.github.api_url != GithubConfig::default().api_url {
            self.github.api_url = other.github.api_url;
        }
        if other.github.repository.is_some() {
            self.github.repository = other.github.repository;
        }
        if other.github.token.is_some() {
            self.github.token = other.github.token;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(constants::ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.name = name,
                Err(_) => tracing::warn!(
                    variable = constants::ENV_PROVIDER,
                    value = %val,
                    "ignoring invalid provider name"
                ),
            }
        }
        if let Ok(val) = env.var(constants::ENV_MODEL) {
            self.provider.model = val;
        }
        if let Ok(val) = env.var(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env
            .var(constants::ENV_API_KEY)
            .or_else(|_| env.var(self.provider.name.api_key_env_var()))
            .ok();
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Ok(val) = env.var(constants::ENV_GITHUB_TOKEN) {
            self.github.token = Some(val);
        }
        if let Ok(val) = env.var(constants::ENV_GITHUB_REPOSITORY) {
            self.github.repository = Some(val);
        }
        if let Ok(val) = env.var(constants::ENV_GITHUB_API_URL) {
            self.github.api_url = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Env {
        Env::mock(Vec::<(&str, &str)>::new())
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.provider.name, ProviderName::OpenAI);
        assert_eq!(config.provider.model, "o4-mini");
        assert_eq!(config.review.title, "AI Code Review");
        assert_eq!(config.review.complete_title, "AI Code Review Complete");
        assert_eq!(config.review.max_concurrent, 5);
        assert!(config.review.status_notes);
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[provider]
name = "anthropic"
model = "claude-sonnet-4-20250514"

[review]
title = "Bot Review"
include_extensions = ["py", ".ts"]
max_concurrent = 2
status_notes = false

[github]
repository = "octo/app"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.name, ProviderName::Anthropic);
        assert_eq!(config.review.title, "Bot Review");
        assert_eq!(config.review.complete_title, "AI Code Review Complete");
        assert_eq!(config.review.max_concurrent, 2);
        assert!(!config.review.status_notes);
        assert_eq!(config.github.repository.as_deref(), Some("octo/app"));
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        base.review.include_extensions = vec!["rs".into()];

        let mut other = Config::default();
        other.provider.name = ProviderName::Groq;
        other.provider.api_key = Some("gsk".into());
        other.review.request_timeout_secs = 30;
        other.review.status_notes = false;
        other.github.token = Some("ghp".into());

        base.merge(other);
        assert_eq!(base.provider.name, ProviderName::Groq);
        assert_eq!(base.provider.api_key.as_deref(), Some("gsk"));
        assert_eq!(base.review.request_timeout_secs, 30);
        assert!(!base.review.status_notes);
        assert_eq!(base.review.include_extensions, vec!["rs"]);
        assert_eq!(base.github.token.as_deref(), Some("ghp"));
    }

    #[test]
    fn env_overrides() {
        let mut config = Config::default();
        let env = Env::mock([
            ("SUGGESTBOT_PROVIDER", "gemini"),
            ("SUGGESTBOT_MODEL", "gemini-2.5-pro"),
            ("GEMINI_API_KEY", "g-key"),
            ("GITHUB_TOKEN", "ghs_x"),
            ("GITHUB_REPOSITORY", "octo/app"),
        ]);
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, ProviderName::Gemini);
        assert_eq!(config.provider.model, "gemini-2.5-pro");
        assert_eq!(config.provider.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.github.token.as_deref(), Some("ghs_x"));
        assert_eq!(config.github.repository.as_deref(), Some("octo/app"));
    }

    #[test]
    fn generic_api_key_wins_over_provider_key() {
        let mut config = Config::default();
        let env = Env::mock([("SUGGESTBOT_API_KEY", "generic"), ("OPENAI_API_KEY", "specific")]);
        config.apply_env_vars(&env);
        assert_eq!(config.provider.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn invalid_provider_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env_vars(&Env::mock([("SUGGESTBOT_PROVIDER", "cohere")]));
        assert_eq!(config.provider.name, ProviderName::OpenAI);
    }

    #[test]
    fn load_reads_repo_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".suggestbot.toml"),
            "[review]\nmax_concurrent = 9\n",
        )
        .unwrap();
        let config = Config::load(Some(dir.path()), &no_env()).unwrap();
        assert_eq!(config.review.max_concurrent, 9);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".suggestbot.toml"), "[review\n").unwrap();
        let err = Config::load(Some(dir.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn extension_filter() {
        let mut review = ReviewConfig::default();
        assert!(review.includes_extension(None));
        assert!(review.includes_extension(Some("png")));

        review.include_extensions = vec!["py".into(), ".TSX".into()];
        assert!(review.includes_extension(Some("py")));
        assert!(review.includes_extension(Some("tsx")));
        assert!(!review.includes_extension(Some("rs")));
        assert!(!review.includes_extension(None));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-secret".into());
        config.github.token = Some("ghp-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("ghp-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
