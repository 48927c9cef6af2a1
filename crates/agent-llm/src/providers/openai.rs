//! OpenAI-compatible chat completions provider
//!
//! Most hosted models speak the OpenAI `/chat/completions` dialect, so one
//! provider with a configurable base URL covers OpenAI itself, Gemini's
//! OpenAI endpoint, Groq, DeepSeek, OpenRouter and the Hugging Face router.
//!
//! # Example
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn example() -> agent_llm::Result<()> {
//! let config = OpenAIConfig::new("gsk-...")
//!     .with_api_base("https://api.groq.com/openai/v1")
//!     .with_timeout(60);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::new("llama-3.3-70b-versatile")
//!     .with_message(Message::user("Analyze the ticker MSFT"));
//! let response = provider.complete(request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL of the API, without the `/chat/completions` suffix
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Name reported by the provider
    pub provider_name: String,
}

impl OpenAIConfig {
    /// Create a config for api.openai.com with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            provider_name: "openai".to_string(),
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the name the provider reports in logs and errors
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(format!(
                "API key for {} is empty",
                config.provider_name
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider for api.openai.com
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.provider_name);

        let body = ChatRequest::from_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(LLMError::from_status(
                status.as_u16(),
                error_text,
                &request.model,
            ));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        // Some gateways report upstream failures inside a 200 body
        if let Some(error) = chat.error {
            return Err(error.into_llm_error(&request.model));
        }

        let choice = chat.choices.into_iter().next().ok_or_else(|| {
            LLMError::UnexpectedResponse("No choices in response".to_string())
        })?;

        let finish_reason = choice.finish_reason.unwrap_or_default();
        debug!("Received response - finish_reason: {}", finish_reason);

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason: map_stop_reason(&finish_reason),
            usage: chat.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }

    fn name(&self) -> &str {
        &self.config.provider_name
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl ChatRequest {
    /// System prompt goes first in the messages array
    fn from_request(request: &CompletionRequest) -> Self {
        let system = request.system.iter().map(|text| ChatMessage {
            role: "system".to_string(),
            content: text.clone(),
        });
        let turns = request.messages.iter().map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        });

        Self {
            model: request.model.clone(),
            messages: system.chain(turns).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    error: Option<ChatError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
    code: Option<serde_json::Value>,
}

impl ChatError {
    fn into_llm_error(self, model: &str) -> LLMError {
        let status = match &self.code {
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        match status.and_then(|s| u16::try_from(s).ok()) {
            Some(status) => LLMError::from_status(status, self.message, model),
            None => LLMError::RequestFailed(self.message),
        }
    }
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        _ => {
            debug!("Unknown finish reason: {}", reason);
            StopReason::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::FailureKind;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> OpenAIProvider {
        let config = OpenAIConfig::new("test-key")
            .with_api_base(server.uri())
            .with_provider_name("groq");
        OpenAIProvider::with_config(config).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("llama-3.3-70b-versatile")
            .with_system("Provide financial analysis")
            .with_message(Message::user("Analyze the ticker AAPL"))
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAIConfig::new("sk-test")
            .with_api_base("https://api.deepseek.com/v1/")
            .with_timeout(30);
        assert_eq!(config.api_base, "https://api.deepseek.com/v1");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.provider_name, "openai");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            OpenAIProvider::new(" "),
            Err(LLMError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_system_prompt_goes_first() {
        let body = ChatRequest::from_request(&request());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Analyze the ticker AAPL");
        assert!(json.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "AAPL looks fine"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .mount(&server)
            .await;

        let response = provider_for(&server).await.complete(request()).await.unwrap();

        assert_eq!(response.text(), "AAPL looks fine");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.map(|u| u.total()), Some(16));
    }

    #[tokio::test]
    async fn test_429_is_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .await
            .complete(request())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::RateLimitExceeded(ref body) if body == "quota exceeded"));
        assert_eq!(err.kind(), FailureKind::RateLimited);
    }

    #[tokio::test]
    async fn test_error_inside_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"message": "Provider returned error", "code": 429}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .await
            .complete(request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::RateLimited);
    }

    #[tokio::test]
    async fn test_null_content_is_blank_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "length"}]
            })))
            .mount(&server)
            .await;

        let response = provider_for(&server).await.complete(request()).await.unwrap();

        assert!(response.message.is_blank());
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_no_choices_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .await
            .complete(request())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::UnexpectedResponse(_)));
    }
}
