//! Application container
//!
//! Wires a [`DigestConfig`] into the object graph the use case runs on:
//! provider, LLM backend, retry decorator, fallback chain.

use crate::config::{BackendConfig, DigestConfig, ProviderKind};
use crate::error::{EquityError, Result};
use crate::outcome::Outcome;
use crate::request::BatchRequest;
use crate::usecase::SummarizationUseCase;
use agent_core::{AgentService, FallbackAgentService, RetryingAgentService};
use agent_llm::providers::{AnthropicProvider, OpenAIConfig, OpenAIProvider};
use agent_llm::{LLMProvider, LlmAgentConfig, LlmAgentService};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the provider client for one backend
pub fn build_provider(backend: &BackendConfig) -> Result<Arc<dyn LLMProvider>> {
    match backend.provider {
        ProviderKind::Anthropic => {
            let mut provider =
                AnthropicProvider::with_timeout(&backend.api_key, backend.timeout_secs)?;
            if let Some(base) = backend.effective_api_base() {
                provider = provider.with_api_base(base);
            }
            Ok(Arc::new(provider))
        }
        kind => {
            let mut config = OpenAIConfig::new(&backend.api_key)
                .with_timeout(backend.timeout_secs)
                .with_provider_name(kind.display_name().to_lowercase());
            if let Some(base) = backend.effective_api_base() {
                config = config.with_api_base(base);
            }
            Ok(Arc::new(OpenAIProvider::with_config(config)?))
        }
    }
}

/// Build one retrying backend of the chain
pub fn build_backend(config: &DigestConfig, backend: &BackendConfig) -> Result<Arc<dyn AgentService>> {
    let provider = build_provider(backend)?;

    let agent_config = LlmAgentConfig {
        model: backend.model.clone(),
        preamble: config.preamble.clone(),
        max_tokens: backend.max_tokens,
        temperature: backend.temperature,
    };
    let agent: Arc<dyn AgentService> =
        Arc::new(LlmAgentService::new(&backend.name, provider, agent_config));

    Ok(Arc::new(RetryingAgentService::with_policy(
        agent,
        config.retry_policy(),
    )))
}

/// Fully wired digest application
pub struct Application {
    config: DigestConfig,
    chain: Arc<FallbackAgentService>,
    use_case: SummarizationUseCase,
}

impl Application {
    /// Build every configured backend, skipping the ones that fail to build
    pub fn from_config(config: DigestConfig) -> Result<Self> {
        let mut backends = Vec::with_capacity(config.backends.len());
        for backend in &config.backends {
            match build_backend(&config, backend) {
                Ok(agent) => backends.push(agent),
                Err(e) => warn!("Skipping backend '{}': {}", backend.name, e),
            }
        }

        if backends.is_empty() {
            return Err(EquityError::ConfigError(
                "none of the configured backends could be built".to_string(),
            ));
        }

        let chain = Arc::new(FallbackAgentService::new(backends).with_name("digest"));
        info!(
            "Fallback chain: {}",
            chain
                .agents()
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let use_case = SummarizationUseCase::new(chain.clone());
        Ok(Self {
            config,
            chain,
            use_case,
        })
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn use_case(&self) -> &SummarizationUseCase {
        &self.use_case
    }

    /// Backend names in priority order
    pub fn backend_names(&self) -> Vec<&str> {
        self.chain.agents().iter().map(|a| a.name()).collect()
    }

    /// Summarize `tickers` with the configured instructions plus `instructions`
    pub async fn summarize<S: AsRef<str>>(
        &self,
        tickers: &[S],
        instructions: &[String],
    ) -> Outcome<String> {
        let mut all = self.config.instructions.clone();
        all.extend_from_slice(instructions);

        let tickers = tickers.iter().map(|t| AsRef::<str>::as_ref(t));
        let batch = BatchRequest::from_tickers(tickers, &all);
        self.use_case.execute(&batch).await
    }

    /// Summarize each ticker as its own batch
    ///
    /// A failing ticker does not stop the others. Results keep input order.
    pub async fn summarize_each<S: AsRef<str>>(
        &self,
        tickers: &[S],
        instructions: &[String],
    ) -> Vec<(String, Outcome<String>)> {
        let mut results = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let ticker = ticker.as_ref();
            let outcome = self.summarize(&[ticker], instructions).await;
            results.push((ticker.to_string(), outcome));
        }
        results
    }
}
