//! Core abstractions for equity-digest
//!
//! This crate defines the [`AgentService`] capability and the two decorators
//! that make a set of unreliable LLM backends usable as one:
//!
//! - [`RetryingAgentService`] absorbs rate limiting from a single backend
//! - [`FallbackAgentService`] walks an ordered list of backends until one answers
//!
//! Failures are reported as [`AgentExecutionError`] for a single backend and
//! [`MultiAgentExecutionError`] once a whole chain is exhausted.

pub mod error;
pub mod fallback;
pub mod retry;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::{
    AgentExecutionError, Cause, Error, FailureKind, MultiAgentExecutionError, Result,
};
pub use fallback::FallbackAgentService;
pub use retry::{RetryPolicy, RetryingAgentService};
pub use service::AgentService;
