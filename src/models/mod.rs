//! Shared types used across all modules.
//!
//! This module defines the core data structures for patches, annotations,
//! anchored comments, and batches. Other modules import from here rather
//! than reaching into each other's internals.

pub mod annotation;
pub mod comment;
pub mod patch;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use annotation::{RawAnnotation, RawLine, Severity, ValidatedAnnotation};
pub use comment::{Anchor, AnchoredComment, Batch, Side};
pub use patch::FilePatch;

/// The resolved input mode for the review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Read a pre-computed unified diff from a file.
    DiffFile(PathBuf),
    /// Read a unified diff from stdin.
    Stdin,
    /// Diff against a git branch or commit.
    GitBase(String),
    /// Fetch the changed files of a pull request from GitHub.
    PullRequest(u64),
}

/// Supported LLM provider backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Anthropic,
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Gemini,
    #[serde(rename = "deepseek")]
    DeepSeek,
    Groq,
    /// Any OpenAI-compatible API (e.g. Ollama, Together, local servers).
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Anthropic => write!(f, "anthropic"),
            ProviderName::OpenAI => write!(f, "openai"),
            ProviderName::Gemini => write!(f, "gemini"),
            ProviderName::DeepSeek => write!(f, "deepseek"),
            ProviderName::Groq => write!(f, "groq"),
            ProviderName::OpenAICompatible => write!(f, "openai-compatible"),
        }
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ProviderName::Anthropic),
            "openai" => Ok(ProviderName::OpenAI),
            "gemini" => Ok(ProviderName::Gemini),
            "deepseek" => Ok(ProviderName::DeepSeek),
            "groq" => Ok(ProviderName::Groq),
            "openai-compatible" => Ok(ProviderName::OpenAICompatible),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: anthropic, openai, \
                 gemini, deepseek, groq, openai-compatible"
            )),
        }
    }
}

impl ProviderName {
    /// Returns the provider-specific environment variable name for the API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
            ProviderName::Gemini => "GEMINI_API_KEY",
            ProviderName::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderName::Groq => "GROQ_API_KEY",
        }
    }
}
