//! Configuration for digest runs
//!
//! A [`DigestConfig`] lists the backends of the fallback chain in priority
//! order, the retry policy applied to each of them and the instructions sent
//! with every ticker. It is built once at the process boundary, either from a
//! JSON file or from provider API keys found in the environment.

use crate::error::{EquityError, Result};
use agent_core::RetryPolicy;
use agent_llm::completion::DEFAULT_MAX_TOKENS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default trigger word for chat commands
pub const DEFAULT_TRIGGER: &str = "stock_daily_digest";

/// Default provider request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const DEFAULT_PREAMBLE: &str = "Provide financial analysis based on the user's query.";

/// Hosted model provider behind a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Groq,
    DeepSeek,
    OpenRouter,
    HuggingFace,
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    /// Every provider, in the order backends are added from the environment
    pub const ALL: [Self; 7] = [
        Self::Gemini,
        Self::Groq,
        Self::DeepSeek,
        Self::OpenRouter,
        Self::HuggingFace,
        Self::OpenAI,
        Self::Anthropic,
    ];

    /// Name used for the backend unless the config sets one
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Groq => "Groq",
            Self::DeepSeek => "DeepSeek",
            Self::OpenRouter => "OpenRouter",
            Self::HuggingFace => "HuggingFace",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Environment variables holding the API key, first match wins
    pub fn api_key_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            Self::Groq => &["GROQ_API_KEY", "GROK_API_KEY"],
            Self::DeepSeek => &["DEEPSEEK_API_KEY"],
            Self::OpenRouter => &["OPENROUTER_API_KEY"],
            Self::HuggingFace => &["HF_API_KEY", "HF_TOKEN"],
            Self::OpenAI => &["OPENAI_API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
        }
    }

    /// OpenAI-compatible endpoint, `None` for the provider's own default
    pub fn default_api_base(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::DeepSeek => Some("https://api.deepseek.com/v1"),
            Self::OpenRouter => Some("https://openrouter.ai/api/v1"),
            Self::HuggingFace => Some("https://router.huggingface.co/v1"),
            Self::OpenAI | Self::Anthropic => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-3-flash-preview",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::DeepSeek => "deepseek-chat",
            Self::OpenRouter => "google/gemini-2.0-flash-exp:free",
            Self::HuggingFace => "deepseek-ai/DeepSeek-V3",
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-sonnet-4-5",
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

/// One backend of the fallback chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Agent name used in logs and error details
    #[serde(default)]
    pub name: String,

    pub provider: ProviderKind,

    /// Model id; the provider's default when empty
    #[serde(default)]
    pub model: String,

    /// API key, `${VAR}` references allowed in files
    pub api_key: String,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl BackendConfig {
    /// Create a backend with the provider's defaults
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            name: provider.display_name().to_string(),
            provider,
            model: provider.default_model().to_string(),
            api_key: api_key.into(),
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Base URL the provider is built with, if any
    pub fn effective_api_base(&self) -> Option<&str> {
        self.api_base
            .as_deref()
            .or_else(|| self.provider.default_api_base())
    }

    /// Resolve `${VAR}` references and fill empty fields with defaults
    fn resolve<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key = agent_utils::env::resolve_with(&self.api_key, lookup)?;
        if let Some(base) = &self.api_base {
            self.api_base = Some(agent_utils::env::resolve_with(base, lookup)?);
        }
        if self.name.trim().is_empty() {
            self.name = self.provider.display_name().to_string();
        }
        if self.model.trim().is_empty() {
            self.model = self.provider.default_model().to_string();
        }
        Ok(())
    }
}

/// Retry settings applied to every backend, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub multiplier_ms: u64,
    pub min_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from(&RetryPolicy::default())
    }
}

impl From<&RetryPolicy> for RetrySettings {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            multiplier_ms: policy.multiplier.as_millis() as u64,
            min_backoff_ms: policy.min_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.multiplier_ms),
            Duration::from_millis(self.min_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

fn default_preamble() -> Vec<String> {
    vec![DEFAULT_PREAMBLE.to_string()]
}

fn default_trigger() -> String {
    DEFAULT_TRIGGER.to_string()
}

/// Configuration of a digest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestConfig {
    /// Backends in priority order
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    #[serde(default)]
    pub retry: RetrySettings,

    /// System prompt lines placed before any request instructions
    #[serde(default = "default_preamble")]
    pub preamble: Vec<String>,

    /// Instructions sent with every ticker
    #[serde(default)]
    pub instructions: Vec<String>,

    /// Chat command trigger word
    #[serde(default = "default_trigger")]
    pub trigger: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
            retry: RetrySettings::default(),
            preamble: default_preamble(),
            instructions: Vec::new(),
            trigger: default_trigger(),
        }
    }
}

impl DigestConfig {
    /// Create a new configuration builder
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder::default()
    }

    /// One backend per provider whose API key is set, in [`ProviderKind::ALL`] order
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(agent_utils::non_empty_var)
    }

    /// Like [`Self::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backends = ProviderKind::ALL
            .iter()
            .filter_map(|kind| {
                kind.api_key_vars()
                    .iter()
                    .find_map(|var| lookup(*var))
                    .map(|key| BackendConfig::new(*kind, key))
            })
            .collect();

        let config = Self {
            backends,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_with(&content, |name| std::env::var(name).ok())
    }

    /// Parse JSON, resolving `${VAR}` references through `lookup`
    pub fn from_json_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = serde_json::from_str(content)?;
        for backend in &mut config.backends {
            backend.resolve(&lookup)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(EquityError::ConfigError(format!(
                "no backends configured; set one of {}",
                ProviderKind::ALL
                    .iter()
                    .map(|k| k.api_key_vars()[0])
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        if let Some(backend) = self.backends.iter().find(|b| b.api_key.trim().is_empty()) {
            return Err(EquityError::ConfigError(format!(
                "backend '{}' has an empty API key",
                backend.name
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(EquityError::ConfigError(
                "maxAttempts must be greater than 0".to_string(),
            ));
        }

        if self.retry.min_backoff_ms > self.retry.max_backoff_ms {
            return Err(EquityError::ConfigError(
                "minBackoffMs must not exceed maxBackoffMs".to_string(),
            ));
        }

        if self.trigger.trim().is_empty() || self.trigger.contains(char::is_whitespace) {
            return Err(EquityError::ConfigError(
                "trigger must be a single word".to_string(),
            ));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }
}

/// Builder for DigestConfig
#[derive(Debug, Default)]
pub struct DigestConfigBuilder {
    backends: Vec<BackendConfig>,
    retry: Option<RetrySettings>,
    preamble: Option<Vec<String>>,
    instructions: Vec<String>,
    trigger: Option<String>,
}

impl DigestConfigBuilder {
    /// Append a backend; order of calls is priority order
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn retry(mut self, retry: RetrySettings) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn retry_policy(mut self, policy: &RetryPolicy) -> Self {
        self.retry = Some(policy.into());
        self
    }

    pub fn preamble(mut self, lines: Vec<String>) -> Self {
        self.preamble = Some(lines);
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DigestConfig> {
        let defaults = DigestConfig::default();

        let config = DigestConfig {
            backends: self.backends,
            retry: self.retry.unwrap_or(defaults.retry),
            preamble: self.preamble.unwrap_or(defaults.preamble),
            instructions: self.instructions,
            trigger: self.trigger.unwrap_or(defaults.trigger),
        };

        config.validate()?;
        Ok(config)
    }
}
