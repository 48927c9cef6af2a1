//! Retry logic with exponential backoff
//!
//! [`RetryPolicy`] describes how often and how patiently to retry, and
//! [`RetryingAgentService`] applies it to one backend so that provider
//! throttling does not reach the caller.

use crate::{AgentService, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first call included
    pub max_attempts: u32,

    /// Multiplier applied to `2^retry` to get the raw backoff
    pub multiplier: Duration,

    /// Lower bound of any backoff
    pub min_backoff: Duration,

    /// Upper bound of any backoff
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(
        max_attempts: u32,
        multiplier: Duration,
        min_backoff: Duration,
        max_backoff: Duration,
    ) -> Self {
        Self {
            max_attempts,
            multiplier,
            min_backoff,
            max_backoff,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_millis(1),
            min_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
        }
    }

    /// Backoff before retry number `retry` (1 for the first retry)
    ///
    /// `min(max_backoff, max(min_backoff, multiplier * 2^retry))`
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        let raw = 2_u32
            .checked_pow(retry)
            .and_then(|factor| self.multiplier.checked_mul(factor))
            .unwrap_or(self.max_backoff);

        raw.max(self.min_backoff).min(self.max_backoff)
    }

    /// Check if an error is retryable
    fn is_retryable(error: &Error) -> bool {
        match error {
            Error::Execution(err) => err.is_rate_limited(),
            Error::Exhausted(_) => false,
        }
    }

    /// Execute an async operation with retry logic
    ///
    /// Returns the first success, the first non-retryable error, or the last
    /// error once every attempt has been used. Errors are never rewrapped.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "Attempt {}/{} for operation: {}",
                attempt, max_attempts, operation_name
            );

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(
                            "Operation '{}' succeeded after {} retries",
                            operation_name,
                            attempt - 1
                        );
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !Self::is_retryable(&error) {
                debug!("Operation '{}' failed with non-retryable error", operation_name);
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!(
                    "Operation '{}' failed after {} attempts: {}",
                    operation_name, max_attempts, error
                );
                return Err(error);
            }

            let backoff = self.backoff_duration(attempt);
            warn!(
                "Operation '{}' rate limited (attempt {}/{}): {}. Retrying in {:?}",
                operation_name, attempt, max_attempts, error, backoff
            );
            sleep(backoff).await;
        }
    }
}

/// Decorator that retries one backend when it is rate limited
pub struct RetryingAgentService {
    inner: Arc<dyn AgentService>,
    policy: RetryPolicy,
}

impl RetryingAgentService {
    /// Wrap `inner` with the default policy
    pub fn new(inner: Arc<dyn AgentService>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    /// Wrap `inner` with a custom policy
    pub fn with_policy(inner: Arc<dyn AgentService>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Get the retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl AgentService for RetryingAgentService {
    async fn answer(&self, query: &str, instructions: &[String]) -> Result<String> {
        self.policy
            .execute(self.inner.name(), || self.inner.answer(query, instructions))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedAgent;
    use crate::{AgentExecutionError, FailureKind};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.min_backoff, Duration::from_secs(30));
        assert_eq!(policy.max_backoff, Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_floor_and_ceiling() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_duration(1), Duration::from_secs(30));
        assert_eq!(policy.backoff_duration(2), Duration::from_secs(30));
        assert_eq!(policy.backoff_duration(5), Duration::from_secs(32));
        assert_eq!(policy.backoff_duration(6), Duration::from_secs(60));
        assert_eq!(policy.backoff_duration(40), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_doubles_with_larger_multiplier() {
        let policy = RetryPolicy {
            multiplier: Duration::from_secs(15),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_duration(1), Duration::from_secs(30));
        assert_eq!(policy.backoff_duration(2), Duration::from_secs(60));
        assert_eq!(policy.backoff_duration(3), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_retry_then_succeed() {
        let backend = Arc::new(ScriptedAgent::new(
            "Gemini",
            vec![
                Err(AgentExecutionError::rate_limited("429 Too Many Requests").into()),
                Err(AgentExecutionError::rate_limited("429 Too Many Requests").into()),
                Ok("report".to_string()),
            ],
        ));
        let service = RetryingAgentService::with_policy(backend.clone(), RetryPolicy::fast());

        let answer = service.answer("q", &[]).await.unwrap();

        assert_eq!(answer, "report");
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let backend = Arc::new(ScriptedAgent::repeating(
            "Gemini",
            Err(AgentExecutionError::new("RESOURCE_EXHAUSTED: quota")
                .with_agent_name("Gemini")
                .into()),
        ));
        let service = RetryingAgentService::with_policy(backend.clone(), RetryPolicy::fast());

        let err = service.answer("q", &[]).await.unwrap_err();

        assert_eq!(backend.calls(), 3);
        match err {
            Error::Execution(e) => {
                assert_eq!(e.to_string(), "[Gemini] RESOURCE_EXHAUSTED: quota");
                assert_eq!(e.kind(), FailureKind::Unclassified);
            }
            Error::Exhausted(_) => panic!("expected the backend's own error"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_without_waiting() {
        let backend = Arc::new(ScriptedAgent::repeating(
            "Groq",
            Err(AgentExecutionError::new("invalid api key")
                .with_kind(FailureKind::Authentication)
                .into()),
        ));
        let service = RetryingAgentService::new(backend.clone());

        let started = tokio::time::Instant::now();
        let err = service.answer("q", &[]).await.unwrap_err();

        assert_eq!(backend.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_waits_between_attempts() {
        let backend = Arc::new(ScriptedAgent::repeating(
            "Gemini",
            Err(AgentExecutionError::rate_limited("429").into()),
        ));
        let service = RetryingAgentService::new(backend.clone());

        let started = tokio::time::Instant::now();
        let _ = service.answer("q", &[]).await;

        assert_eq!(backend.calls(), 3);
        // Two waits at the 30s floor, none after the last attempt
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_aggregate_errors_are_not_retried() {
        let backend = Arc::new(ScriptedAgent::repeating(
            "Chain",
            Err(crate::MultiAgentExecutionError::default().into()),
        ));
        let service = RetryingAgentService::with_policy(backend.clone(), RetryPolicy::fast());

        assert!(matches!(
            service.answer("q", &[]).await,
            Err(Error::Exhausted(_))
        ));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_name_is_forwarded() {
        let backend = Arc::new(ScriptedAgent::new("DeepSeek", vec![]));
        let service = RetryingAgentService::new(backend);
        assert_eq!(service.name(), "DeepSeek");
        assert_eq!(service.policy(), &RetryPolicy::default());
    }
}
