//! Raw HTTP client for the Anthropic Messages API.
//!
//! No pipeline awareness - just a [`GenerationBackend`] over reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationBackend, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

/// Request body for the Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

/// A single message in the conversation.
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Response from the Messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// A content block in the response.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl MessagesResponse {
    /// Extract the text content from the first text block, if any.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.content_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

/// Anthropic-backed [`GenerationBackend`].
#[derive(Debug)]
pub struct AnthropicBackend {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicBackend {
    /// Create a backend reading `ANTHROPIC_API_KEY` from the
    /// environment.
    pub fn from_env(model: &str) -> Result<Self, LlmError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| LlmError::MissingApiKey("ANTHROPIC_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, model))
    }

    /// Create a backend with an explicit API key and the default base
    /// URL.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Override the base URL (for testing against mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system: system.map(str::to_string),
        };

        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after });
        }

        if status >= 400 {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(LlmError::Api {
                status,
                message: body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {e}")))?;

        parsed
            .text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("no text block in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_creation() {
        let backend = AnthropicBackend::new("test-key", "claude-sonnet-4-20250514");
        assert_eq!(backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(backend.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn backend_custom_base_url() {
        let backend =
            AnthropicBackend::new("test-key", "m").with_base_url("http://localhost:8080");
        assert_eq!(backend.base_url, "http://localhost:8080");
    }

    #[test]
    fn request_serializes_system_only_when_present() {
        let req = MessagesRequest {
            model: "m".into(),
            max_tokens: 16,
            messages: vec![Message {
                role: "user".into(),
                content: "hi".into(),
            }],
            system: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("system"));

        let req = MessagesRequest {
            system: Some("be terse".into()),
            ..req
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"system\":\"be terse\""));
    }

    #[test]
    fn response_text_extraction() {
        let json = r#"{
            "content": [
                {"type": "thinking", "text": null},
                {"type": "text", "text": "reply here"}
            ]
        }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text(), Some("reply here"));
    }
}
