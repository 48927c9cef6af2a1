//! Error types for agent-core
//!
//! A single backend failure is an [`AgentExecutionError`]. When every backend
//! in a fallback chain gives up, the failures are collected into a
//! [`MultiAgentExecutionError`]. [`Error`] is what [`crate::AgentService`]
//! implementations return and covers both shapes.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying error carried as the cause of a backend failure
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Markers that identify a rate-limit failure when no structured kind is set
const RATE_LIMIT_MARKERS: [&str; 2] = ["429", "resource_exhausted"];

/// Machine-checkable classification of a backend failure
///
/// Set by the adapter that talks to the provider, so retry decisions do not
/// depend on the wording of the provider's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FailureKind {
    /// Provider throttled the request (HTTP 429, quota exhausted)
    RateLimited,
    /// Credentials missing or rejected
    Authentication,
    /// Provider rejected the request as malformed
    InvalidRequest,
    /// Requested model does not exist for this provider
    ModelNotFound,
    /// Network or HTTP transport failure
    Transport,
    /// Provider answered with something that could not be used
    EmptyResponse,
    /// Any other provider-reported failure
    Provider,
    /// The adapter did not classify the failure
    #[default]
    Unclassified,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RateLimited => "rate_limited",
            Self::Authentication => "authentication",
            Self::InvalidRequest => "invalid_request",
            Self::ModelNotFound => "model_not_found",
            Self::Transport => "transport",
            Self::EmptyResponse => "empty_response",
            Self::Provider => "provider",
            Self::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

/// Failure of one agent backend to produce an answer
#[derive(Debug, Clone)]
pub struct AgentExecutionError {
    message: String,
    agent_name: Option<String>,
    kind: FailureKind,
    cause: Option<Cause>,
}

impl AgentExecutionError {
    /// Create an unclassified error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agent_name: None,
            kind: FailureKind::Unclassified,
            cause: None,
        }
    }

    /// Create a rate-limit error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(FailureKind::RateLimited)
    }

    /// Attach the name of the agent that failed
    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Set the failure classification
    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach the underlying error
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// The human-readable message, without agent name or cause
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the agent that produced the error, when known
    pub fn agent_name(&self) -> Option<&str> {
        self.agent_name.as_deref()
    }

    /// Failure classification
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Underlying error, when known
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Whether retrying the same backend may succeed
    ///
    /// Structured kinds win. Only unclassified errors fall back to looking for
    /// a rate-limit marker in the message and cause text; the agent name is
    /// never searched.
    pub fn is_rate_limited(&self) -> bool {
        match self.kind {
            FailureKind::RateLimited => true,
            FailureKind::Unclassified => {
                let mut text = self.message.to_ascii_lowercase();
                if let Some(cause) = &self.cause {
                    text.push('\n');
                    text.push_str(&cause.to_string().to_ascii_lowercase());
                }
                RATE_LIMIT_MARKERS.iter().any(|marker| text.contains(marker))
            }
            _ => false,
        }
    }
}

impl fmt::Display for AgentExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.agent_name {
            Some(name) => write!(f, "[{name}] {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        if let Some(cause) = &self.cause {
            write!(f, " | Caused by: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AgentExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Every agent in a fallback chain failed or returned a blank answer
#[derive(Debug, Clone, Default)]
pub struct MultiAgentExecutionError {
    errors: Vec<AgentExecutionError>,
    blank_answers: Vec<String>,
}

impl MultiAgentExecutionError {
    /// Create an aggregate from the recorded failures, in call order
    pub fn new(errors: Vec<AgentExecutionError>) -> Self {
        Self {
            errors,
            blank_answers: Vec::new(),
        }
    }

    /// Record the agents that answered with blank text, in call order
    pub fn with_blank_answers(mut self, names: Vec<String>) -> Self {
        self.blank_answers = names;
        self
    }

    /// Recorded failures in the order the agents were tried
    pub fn errors(&self) -> &[AgentExecutionError] {
        &self.errors
    }

    /// Names of agents that returned blank text without failing
    pub fn blank_answers(&self) -> &[String] {
        &self.blank_answers
    }

    /// Consume the aggregate, returning its failures
    pub fn into_errors(self) -> Vec<AgentExecutionError> {
        self.errors
    }

    /// Short summary, e.g. `2 agents failed to provide an answer.`
    pub fn message(&self) -> String {
        format!("{} agents failed to provide an answer.", self.errors.len())
    }

    /// Summary followed by one line per failure
    pub fn detailed(&self) -> String {
        let mut out = format!("{}\nDetailed Failures:", self.message());
        for error in &self.errors {
            out.push_str(&format!("\n  - {error}"));
        }
        if !self.blank_answers.is_empty() {
            out.push_str(&format!(
                "\nBlank answers from: {}",
                self.blank_answers.join(", ")
            ));
        }
        out
    }
}

impl fmt::Display for MultiAgentExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for MultiAgentExecutionError {}

impl From<AgentExecutionError> for MultiAgentExecutionError {
    fn from(err: AgentExecutionError) -> Self {
        Self::new(vec![err])
    }
}

/// Error type for agent operations
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A single agent failed
    #[error(transparent)]
    Execution(#[from] AgentExecutionError),

    /// Every agent in a chain failed
    #[error(transparent)]
    Exhausted(#[from] MultiAgentExecutionError),
}

impl Error {
    /// View the failure as an aggregate; a single failure becomes a list of one
    pub fn into_aggregate(self) -> MultiAgentExecutionError {
        match self {
            Self::Execution(err) => err.into(),
            Self::Exhausted(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn test_display_with_name_and_cause() {
        let err = AgentExecutionError::new("boom")
            .with_agent_name("Finance_Agent")
            .with_cause(Reset);
        assert_eq!(err.to_string(), "[Finance_Agent] boom | Caused by: connection reset");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_without_name() {
        let err = AgentExecutionError::new("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.agent_name(), None);
        assert_eq!(err.kind(), FailureKind::Unclassified);
    }

    #[test]
    fn test_structured_kind_wins_over_text() {
        // Mentions 429 but the adapter knows it is an auth problem
        let err = AgentExecutionError::new("key 429abc rejected")
            .with_kind(FailureKind::Authentication);
        assert!(!err.is_rate_limited());

        let err = AgentExecutionError::rate_limited("slow down");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_text_fallback_for_unclassified() {
        assert!(AgentExecutionError::new("HTTP 429 Too Many Requests").is_rate_limited());
        assert!(AgentExecutionError::new("status: RESOURCE_EXHAUSTED").is_rate_limited());
        assert!(!AgentExecutionError::new("invalid api key").is_rate_limited());
    }

    #[derive(Debug, Error)]
    #[error("upstream returned RESOURCE_EXHAUSTED")]
    struct Exhausted;

    #[test]
    fn test_agent_name_is_not_searched() {
        let err = AgentExecutionError::new("connection refused").with_agent_name("gpt-4-0429");
        assert!(!err.is_rate_limited());

        let err = AgentExecutionError::new("request failed")
            .with_agent_name("gpt-4-0429")
            .with_cause(Exhausted);
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_aggregate_messages() {
        let agg = MultiAgentExecutionError::new(vec![
            AgentExecutionError::new("a failed").with_agent_name("A"),
            AgentExecutionError::new("b failed").with_agent_name("B"),
        ]);
        assert_eq!(agg.to_string(), "2 agents failed to provide an answer.");
        assert_eq!(
            agg.detailed(),
            "2 agents failed to provide an answer.\nDetailed Failures:\n  - [A] a failed\n  - [B] b failed"
        );
    }

    #[test]
    fn test_into_aggregate_wraps_single_error() {
        let err: Error = AgentExecutionError::new("x").with_agent_name("A").into();
        let agg = err.into_aggregate();
        assert_eq!(agg.errors().len(), 1);
        assert_eq!(agg.errors()[0].agent_name(), Some("A"));
    }
}
