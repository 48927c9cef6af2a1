//! Ticker summarization use case

use crate::outcome::{Error, Outcome};
use crate::request::BatchRequest;
use agent_core::AgentService;
use std::sync::Arc;
use tracing::{info, warn};

/// Runs a batch of ticker requests through one agent service
///
/// Tickers are processed one after the other. The first ticker whose
/// service call fails ends the run; answers already collected are dropped.
pub struct SummarizationUseCase {
    agent: Arc<dyn AgentService>,
}

impl SummarizationUseCase {
    pub fn new(agent: Arc<dyn AgentService>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Arc<dyn AgentService> {
        &self.agent
    }

    /// Summarize every ticker, joining the answers with newlines
    pub async fn execute(&self, batch: &BatchRequest) -> Outcome<String> {
        let mut answers = Vec::with_capacity(batch.len());

        for (index, request) in batch.iter().enumerate() {
            info!(
                "Summarizing {} ({}/{})",
                request.ticker(),
                index + 1,
                batch.len()
            );

            match self
                .agent
                .answer(&request.query(), request.instructions())
                .await
            {
                Ok(answer) => answers.push(answer),
                Err(err) => {
                    let aggregate = err.into_aggregate();
                    warn!(
                        "Digest aborted at {}: {}",
                        request.ticker(),
                        aggregate.detailed()
                    );
                    return Err(Error::from(aggregate));
                }
            }
        }

        Ok(answers.join("\n"))
    }
}
