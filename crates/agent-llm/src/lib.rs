//! LLM provider abstraction layer for equity-digest
//!
//! This crate provides provider-agnostic types for talking to hosted models
//! and the adapter that turns a provider into an [`agent_core::AgentService`]:
//!
//! - Message and completion request/response types
//! - The [`LLMProvider`] trait
//! - Concrete providers (behind feature flags)
//! - [`LlmAgentService`], one fallback-chain backend per provider/model pair

pub mod agent;
pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use agent::{LlmAgentConfig, LlmAgentService};
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
pub mod providers;
