//! Typed failure returned by the summarization use case

use agent_core::MultiAgentExecutionError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key used in [`Error::details`] for failures with no agent name
pub const UNKNOWN_AGENT: &str = "Unknown";

/// Outcome of one use-case run
pub type Outcome<T> = std::result::Result<T, Error>;

/// Machine-readable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Every backend failed for one of the tickers
    AgentExecutionError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentExecutionError => "AGENT_EXECUTION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a digest run, with a per-backend breakdown
///
/// `details` maps agent name to that agent's full failure text, in the order
/// the agents were tried. When two failures share a name, the later text
/// replaces the earlier one. Agents that answered with blank text are not
/// failures and are listed separately in `blank_answers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blank_answers: Vec<String>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: IndexMap::new(),
            blank_answers: Vec::new(),
        }
    }

    /// Add or replace one detail entry
    pub fn with_detail(mut self, agent: impl Into<String>, description: impl Into<String>) -> Self {
        self.details.insert(agent.into(), description.into());
        self
    }
}

impl From<MultiAgentExecutionError> for Error {
    fn from(err: MultiAgentExecutionError) -> Self {
        let details = err
            .errors()
            .iter()
            .map(|e| {
                (
                    e.agent_name().unwrap_or(UNKNOWN_AGENT).to_string(),
                    e.to_string(),
                )
            })
            .collect();

        Self {
            code: ErrorCode::AgentExecutionError,
            message: err.message(),
            details,
            blank_answers: err.blank_answers().to_vec(),
        }
    }
}

impl From<agent_core::Error> for Error {
    fn from(err: agent_core::Error) -> Self {
        err.into_aggregate().into()
    }
}
