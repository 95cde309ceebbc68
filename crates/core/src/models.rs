//! # Model Configuration
//!
//! Centralized LLM provider selection for the pipeline. Every stage
//! shares one configured backend; per-run overrides happen by
//! constructing a different `ModelConfig` before the run starts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::llm::{AnthropicBackend, GenerationBackend, LlmError, OpenAiBackend};

/// Supported LLM providers.
///
/// API keys come from the environment: `ANTHROPIC_API_KEY` and
/// `OPENAI_API_KEY`. `OpenAi` with a base-URL override also covers
/// self-hosted OpenAI-compatible endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl LlmProvider {
    /// Display name for logs and CLI output.
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAi => "OpenAI",
        }
    }

    /// Whether this provider supports a custom base URL.
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::OpenAi)
    }
}

/// Configuration for LLM model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g. "claude-sonnet-4-20250514", "gpt-4o")
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: None,
        }
    }
}

impl ModelConfig {
    /// Config for the default provider (Anthropic) with a specific
    /// model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            model: model.into(),
            base_url: None,
        }
    }

    /// Config for a specific provider.
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
        }
    }

    /// Set the base URL (for OpenAI-compatible endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Construct the generation backend for the configured provider.
    /// API keys load from the environment via `from_env()`.
    pub fn create_backend(&self) -> Result<Arc<dyn GenerationBackend>, LlmError> {
        match self.provider {
            LlmProvider::Anthropic => Ok(Arc::new(AnthropicBackend::from_env(&self.model)?)),
            LlmProvider::OpenAi => {
                let backend = OpenAiBackend::from_env(&self.model)?;
                let backend = if let Some(base_url) = &self.base_url {
                    backend.with_base_url(base_url)
                } else {
                    backend
                };
                Ok(Arc::new(backend))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert!(config.model.contains("claude"));
    }

    #[test]
    fn test_provider_display_names() {
        assert_eq!(LlmProvider::Anthropic.display_name(), "Anthropic");
        assert_eq!(LlmProvider::OpenAi.display_name(), "OpenAI");
    }

    #[test]
    fn test_base_url_support() {
        assert!(LlmProvider::OpenAi.supports_base_url());
        assert!(!LlmProvider::Anthropic.supports_base_url());
    }

    #[test]
    fn test_model_config_serialization() {
        let config =
            ModelConfig::with_provider(LlmProvider::OpenAi, "gpt-4o").with_base_url("http://x");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("openai"));
        assert!(json.contains("gpt-4o"));
    }
}
