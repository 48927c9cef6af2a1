//! Ordered fallback across several agent backends

use crate::{AgentExecutionError, AgentService, Error, MultiAgentExecutionError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_NAME: &str = "fallback";

/// Tries each backend in priority order until one gives a non-blank answer
///
/// The first non-blank answer wins; later backends are not called. Failures
/// are collected in call order and returned together when no backend
/// answers. A blank answer is not a failure, but the backend's name is kept
/// on the aggregate so it can be told apart from backends never tried.
///
/// # Example
///
/// ```no_run
/// use agent_core::{AgentService, FallbackAgentService};
/// use std::sync::Arc;
///
/// # async fn example(primary: Arc<dyn AgentService>, backup: Arc<dyn AgentService>) -> agent_core::Result<()> {
/// let chain = FallbackAgentService::new(vec![primary, backup]);
/// let report = chain.answer("Analyze the ticker AAPL", &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct FallbackAgentService {
    name: String,
    agents: Vec<Arc<dyn AgentService>>,
}

impl FallbackAgentService {
    /// Create a chain from backends in priority order
    pub fn new(agents: Vec<Arc<dyn AgentService>>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            agents,
        }
    }

    /// Set the name reported by the chain itself
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Backends in the order they are tried
    pub fn agents(&self) -> &[Arc<dyn AgentService>] {
        &self.agents
    }

    /// Number of backends in the chain
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if the chain has no backends
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Run the chain, returning the aggregate failure directly
    pub async fn try_answer(
        &self,
        query: &str,
        instructions: &[String],
    ) -> std::result::Result<String, MultiAgentExecutionError> {
        let mut errors: Vec<AgentExecutionError> = Vec::new();
        let mut blank_answers = Vec::new();

        for (index, agent) in self.agents.iter().enumerate() {
            debug!(
                "Trying agent '{}' ({}/{})",
                agent.name(),
                index + 1,
                self.agents.len()
            );

            match agent.answer(query, instructions).await {
                Ok(answer) if !answer.trim().is_empty() => {
                    if index > 0 {
                        info!("Agent '{}' answered after {} fallbacks", agent.name(), index);
                    }
                    return Ok(answer);
                }
                Ok(_) => {
                    warn!("Agent '{}' returned a blank answer", agent.name());
                    blank_answers.push(agent.name().to_string());
                }
                Err(Error::Execution(err)) => {
                    warn!("Agent '{}' failed: {}", agent.name(), err);
                    errors.push(err);
                }
                Err(Error::Exhausted(agg)) => {
                    warn!("Agent '{}' failed: {}", agent.name(), agg);
                    blank_answers.extend(agg.blank_answers().iter().cloned());
                    errors.extend(agg.into_errors());
                }
            }
        }

        warn!(
            "All {} agents in '{}' failed to answer",
            self.agents.len(),
            self.name
        );
        Err(MultiAgentExecutionError::new(errors).with_blank_answers(blank_answers))
    }
}

#[async_trait]
impl AgentService for FallbackAgentService {
    async fn answer(&self, query: &str, instructions: &[String]) -> Result<String> {
        Ok(self.try_answer(query, instructions).await?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
