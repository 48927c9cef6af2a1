//! Agent backend bound to one LLM provider and model

use crate::{CompletionRequest, LLMProvider, Message};
use agent_core::{AgentExecutionError, AgentService};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Configuration for an [`LlmAgentService`]
#[derive(Debug, Clone)]
pub struct LlmAgentConfig {
    /// Model to use
    pub model: String,

    /// Instructions placed before any per-request instructions
    pub preamble: Vec<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature for sampling; provider default when unset
    pub temperature: Option<f32>,
}

impl LlmAgentConfig {
    /// Create a config for `model` with no preamble
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            preamble: Vec::new(),
            max_tokens: crate::completion::DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }
}

/// One backend of the fallback chain: a provider plus a model
///
/// The system prompt is the preamble followed by the request's instructions,
/// one per line and in order; the query is sent as the user message.
/// Provider errors come back as [`AgentExecutionError`] tagged with this
/// agent's name and the provider's [`agent_core::FailureKind`].
pub struct LlmAgentService {
    name: String,
    provider: Arc<dyn LLMProvider>,
    config: LlmAgentConfig,
}

impl LlmAgentService {
    /// Create a new backend
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
        config: LlmAgentConfig,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            config,
        }
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &LlmAgentConfig {
        &self.config
    }

    fn build_request(&self, query: &str, instructions: &[String]) -> CompletionRequest {
        let system = self
            .config
            .preamble
            .iter()
            .chain(instructions)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        CompletionRequest::new(&self.config.model)
            .with_system(system)
            .with_message(Message::user(query))
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
    }
}

#[async_trait]
impl AgentService for LlmAgentService {
    async fn answer(&self, query: &str, instructions: &[String]) -> agent_core::Result<String> {
        let request = self.build_request(query, instructions);

        let response = self.provider.complete(request).await.map_err(|e| {
            AgentExecutionError::new(format!(
                "{} request to {} failed",
                self.config.model,
                self.provider.name()
            ))
            .with_agent_name(&self.name)
            .with_kind(e.kind())
            .with_cause(e)
        })?;

        debug!(
            "Agent '{}' received {} characters (stop_reason: {:?})",
            self.name,
            response.text().len(),
            response.stop_reason
        );

        Ok(response.message.content)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionResponse, LLMError, StopReason};
    use agent_core::{Error, FailureKind};
    use std::sync::Mutex;

    struct MockProvider {
        reply: fn() -> crate::Result<String>,
        seen: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl LLMProvider for MockProvider {
        async fn complete(&self, request: CompletionRequest) -> crate::Result<CompletionResponse> {
            *self.seen.lock().unwrap() = Some(request);
            (self.reply)().map(|text| CompletionResponse {
                message: Message::assistant(text),
                stop_reason: StopReason::EndTurn,
                usage: None,
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn agent(reply: fn() -> crate::Result<String>) -> (LlmAgentService, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider {
            reply,
            seen: Mutex::new(None),
        });
        let mut config = LlmAgentConfig::new("test-model");
        config.preamble = vec!["Provide financial analysis based on the user's query.".to_string()];
        (
            LlmAgentService::new("Finance_Agent", provider.clone(), config),
            provider,
        )
    }

    #[tokio::test]
    async fn test_prompt_layout() {
        let (agent, provider) = agent(|| Ok("report".to_string()));
        let instructions = vec!["Use tables".to_string(), "Be concise".to_string()];

        let answer = agent.answer("Analyze AAPL", &instructions).await.unwrap();

        assert_eq!(answer, "report");
        let seen = provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(
            seen.system.as_deref(),
            Some("Provide financial analysis based on the user's query.\nUse tables\nBe concise")
        );
        assert_eq!(seen.messages, vec![Message::user("Analyze AAPL")]);
        assert_eq!(seen.model, "test-model");
    }

    #[tokio::test]
    async fn test_provider_error_is_classified() {
        let (agent, _) = agent(|| Err(LLMError::RateLimitExceeded("quota".to_string())));

        match agent.answer("q", &[]).await {
            Err(Error::Execution(err)) => {
                assert_eq!(err.agent_name(), Some("Finance_Agent"));
                assert_eq!(err.kind(), FailureKind::RateLimited);
                assert!(err.is_rate_limited());
                assert_eq!(
                    err.to_string(),
                    "[Finance_Agent] test-model request to mock failed | Caused by: Rate limit exceeded: quota"
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_answer_passes_through() {
        let (agent, _) = agent(|| Ok(String::new()));
        assert_eq!(agent.answer("q", &[]).await.unwrap(), "");
    }
}
