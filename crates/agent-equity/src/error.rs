//! Error types for building and running digests
//!
//! [`EquityError`] covers everything that can go wrong before the use case
//! runs: configuration, market-data access, provider construction. Failures
//! of the use case itself are reported through [`crate::Error`].

use std::time::Duration;
use thiserror::Error;

/// Digest setup and I/O errors
#[derive(Debug, Error)]
pub enum EquityError {
    /// Configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Yahoo Finance could not be reached or answered with an error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// A backend's provider could not be constructed
    #[error("Provider error: {0}")]
    ProviderError(#[from] agent_llm::LLMError),

    /// A `${VAR}` reference in the configuration could not be resolved
    #[error("Environment error: {0}")]
    EnvError(#[from] agent_utils::EnvError),

    /// The digest did not finish in time
    #[error("Digest timed out after {0:?}")]
    Timeout(Duration),

    /// Reading a configuration file failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for digest setup
pub type Result<T> = std::result::Result<T, EquityError>;
