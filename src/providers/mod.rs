//! ReviewProvider trait and LLM integration.
//!
//! The generative model is a black box that turns a prompt into text.
//! Parsing that text is the annotation normalizer's job, not the provider's.

pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the review provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
}

/// Text completion backend used for per-file review.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Send one system + user prompt pair and return the raw response text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}
