//! Equity research digests
//!
//! This crate turns a list of ticker symbols into investment research
//! summaries by asking a chain of hosted LLM backends, falling back from one
//! provider to the next when a provider fails or is throttled.
//!
//! # Architecture
//!
//! - [`SummarizationUseCase`] runs a [`BatchRequest`] through any
//!   [`agent_core::AgentService`] and reports failures as a typed [`Error`]
//! - [`Application`] builds the service from a [`DigestConfig`]: each backend
//!   is an [`agent_llm::LlmAgentService`] wrapped in
//!   [`agent_core::RetryingAgentService`], all of them ordered in an
//!   [`agent_core::FallbackAgentService`]
//! - [`TickerValidator`] filters symbols before any backend is called
//! - [`DigestCommand`] parses chat messages and builds the replies
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_equity::{Application, DigestConfig, render_outcome};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DigestConfig::from_env()?;
//!     let app = Application::from_config(config)?;
//!
//!     let outcome = app.summarize(&["AAPL", "MSFT"], &[]).await;
//!     println!("{}", render_outcome(&outcome));
//!
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod container;
pub mod error;
pub mod outcome;
pub mod render;
pub mod request;
pub mod usecase;
pub mod validator;

pub use command::DigestCommand;
pub use config::{BackendConfig, DigestConfig, ProviderKind, RetrySettings};
pub use container::Application;
pub use error::{EquityError, Result};
pub use outcome::{Error, ErrorCode, Outcome};
pub use render::{render_error, render_outcome};
pub use request::{BatchRequest, TickerRequest};
pub use usecase::SummarizationUseCase;
pub use validator::{TickerPartition, TickerValidator, YahooTickerValidator, partition_tickers};
