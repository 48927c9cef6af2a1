//! The agent service capability

use crate::Result;
use async_trait::async_trait;

/// Anything that can answer a free-text query
///
/// Implementations range from a single provider binding to decorators that
/// retry one backend or fall back across several.
///
/// A successful answer must not be blank: callers treat blank text as
/// "no answer" and may move on to another backend.
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Answer `query`, following `instructions` in order
    async fn answer(&self, query: &str, instructions: &[String]) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;
}

