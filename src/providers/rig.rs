//! rig-core integration for LLM-backed code review.
//!
//! Uses rig-core's provider clients and Agent abstraction for multi-provider
//! support. Currently supports: Anthropic, OpenAI, Gemini, DeepSeek, Groq,
//! and any OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;

use crate::config::ProviderConfig;
use crate::models::ProviderName;

use super::{ProviderError, ReviewProvider};

/// Maximum tokens per LLM completion response.
///
/// Reasoning models spend part of this budget before emitting any text.
const MAX_TOKENS: u64 = 16384;

/// Maximum number of retry attempts for transient API errors.
pub const MAX_RETRIES: u32 = 3;

/// Initial backoff delay between retries.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(5);

/// Maximum backoff delay between retries.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Build a single-turn agent from a rig-core client and prompt it.
///
/// Always sets `max_tokens`; without it some providers (e.g. Gemini)
/// default to a low limit that truncates responses.
macro_rules! prompt_simple {
    ($client:expr, $model:expr, $system:expr, $user:expr, $label:expr) => {{
        let agent = $client
            .agent($model)
            .preamble($system)
            .temperature(0.0)
            .max_tokens(MAX_TOKENS)
            .build();
        agent
            .prompt($user)
            .await
            .map_err(|e| ProviderError::ApiError(format!("{} API error: {e}", $label)))
    }};
}

/// Create a rig-core client using the `Client::new(api_key)` convention.
macro_rules! new_client {
    ($provider_mod:path, $api_key:expr, $label:expr) => {{
        <$provider_mod>::new($api_key).map_err(|e| {
            ProviderError::ApiError(format!("failed to create {} client: {e}", $label))
        })
    }};
}

/// rig-core based review provider.
///
/// The provider name in config selects which rig-core client to use.
pub struct RigProvider {
    config: ProviderConfig,
}

impl RigProvider {
    /// Create a new RigProvider with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or {}.",
                config.name,
                crate::constants::ENV_API_KEY,
                config.name.api_key_env_var()
            )));
        }
        Ok(Self { config })
    }

    /// Model name requests are sent to.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Require `base_url` for OpenAI-compatible providers.
    fn require_base_url(&self) -> Result<&str, ProviderError> {
        self.config.base_url.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "openai-compatible provider requires base_url to be set".to_string(),
            )
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_openai_client(
        &self,
        api_key: &str,
        base_url: Option<&str>,
        label: &str,
    ) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(base_url) = base_url {
            builder = builder.base_url(base_url);
        }
        builder
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create {label} client: {e}")))
    }
}

#[async_trait]
impl ReviewProvider for RigProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let model = self.config.model.as_str();

        match self.config.name {
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ProviderError::ApiError(format!("failed to create Anthropic client: {e}"))
                    })?;
                prompt_simple!(client, model, system, prompt, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client =
                    self.build_openai_client(api_key, self.config.base_url.as_deref(), "OpenAI")?;
                prompt_simple!(client, model, system, prompt, "OpenAI")
            }
            ProviderName::Gemini => {
                let client = new_client!(providers::gemini::Client, api_key, "Gemini")?;
                prompt_simple!(client, model, system, prompt, "Gemini")
            }
            ProviderName::DeepSeek => {
                let client = new_client!(providers::deepseek::Client, api_key, "DeepSeek")?;
                prompt_simple!(client, model, system, prompt, "DeepSeek")
            }
            ProviderName::Groq => {
                let client = new_client!(providers::groq::Client, api_key, "Groq")?;
                prompt_simple!(client, model, system, prompt, "Groq")
            }
            ProviderName::OpenAICompatible => {
                let base_url = self.require_base_url()?;
                let client =
                    self.build_openai_client(api_key, Some(base_url), "OpenAI-compatible")?;
                prompt_simple!(client, model, system, prompt, "OpenAI-compatible")
            }
        }
    }
}

/// Check whether a provider error is transient and worth retrying.
///
/// Matches rate limiting, temporary unavailability, and connection or
/// timeout failures. Configuration errors are never retried.
pub fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Timeout(_) => true,
        _ => classify_error(err).is_some(),
    }
}

/// Classifies a provider error into a short, user-friendly message.
///
/// Returns `Some(message)` for transient/retryable errors, `None` otherwise.
pub fn classify_error(err: &ProviderError) -> Option<&'static str> {
    match err {
        ProviderError::ApiError(msg) => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("429")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("too many requests")
            {
                Some("Rate limited by API")
            } else if msg_lower.contains("503")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("high demand")
            {
                Some("High model load")
            } else if msg_lower.contains("529") || msg_lower.contains("overloaded") {
                Some("API overloaded")
            } else if msg_lower.contains("502") {
                Some("API gateway error")
            } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
                Some("Request timed out")
            } else if msg_lower.contains("connection") {
                Some("Connection error")
            } else if msg_lower.contains("temporarily") || msg_lower.contains("try again") {
                Some("Temporary API error")
            } else {
                None
            }
        }
        ProviderError::Timeout(_) => Some("Request timed out"),
        ProviderError::NotConfigured(_) => None,
    }
}
