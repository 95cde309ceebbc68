//! # Generation Backends
//!
//! The seam between the orchestration core and the text-generation
//! service. The core only ever sees [`GenerationBackend`]: one prompt
//! in, one reply out, no state retained between calls. Provider
//! clients live in submodules; tests substitute scripted
//! implementations.

pub mod anthropic;
pub mod openai;
pub mod structured;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;
pub use structured::StructuredFunction;

use async_trait::async_trait;

/// Errors from generation-backend calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

/// Opaque text-completion service.
///
/// One request, one reply. Model identity, latency, and rate limits
/// are the provider's concern; the orchestrator assumes nothing beyond
/// this contract and never assumes determinism.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Issue one completion request and return the reply text.
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError>;
}
