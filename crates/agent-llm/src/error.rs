//! Error types for LLM operations

use agent_core::FailureKind;
use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Map an unsuccessful HTTP status to an error
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }

    /// Structured classification used by the retry layer
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimitExceeded(_) => FailureKind::RateLimited,
            Self::AuthenticationFailed(_) => FailureKind::Authentication,
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::ModelNotFound(_) => FailureKind::ModelNotFound,
            Self::HttpError(e) if e.status().is_some_and(|s| s.as_u16() == 429) => {
                FailureKind::RateLimited
            }
            Self::HttpError(_) => FailureKind::Transport,
            Self::SerializationError(_) | Self::UnexpectedResponse(_) => {
                FailureKind::EmptyResponse
            }
            Self::RequestFailed(_) => FailureKind::Provider,
            Self::ConfigurationError(_) => FailureKind::InvalidRequest,
        }
    }
}
