//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations wrap one hosted model API (OpenAI-compatible endpoints,
/// Anthropic). They report failures as [`crate::LLMError`] so callers can
/// tell throttling from hard errors.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;
}
