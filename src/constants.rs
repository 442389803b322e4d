//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! platform limits, and status-note texts so a rename only requires
//! changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "suggestbot";

/// Crate version, as reported by `suggestbot version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.suggestbot.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".suggestbot.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "suggestbot";

/// Maximum number of inline comments GitHub accepts in a single review.
pub const MAX_COMMENTS_PER_REVIEW: usize = 30;

/// Default GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

// ── Status notes ────────────────────────────────────────────────────

pub const STARTED_NOTE: &str = "🤖 AI Code Review started...";
pub const NO_ISSUES_NOTE: &str = "AI Code Review Complete - No issues found! Great job!";
pub const FAILED_NOTE_HINT: &str = "Please check the logs or try again.";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "SUGGESTBOT_PROVIDER";
pub const ENV_MODEL: &str = "SUGGESTBOT_MODEL";
pub const ENV_API_KEY: &str = "SUGGESTBOT_API_KEY";
pub const ENV_BASE_URL: &str = "SUGGESTBOT_BASE_URL";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
