//! Shared utilities for equity-digest
//!
//! Logging setup and the small amount of environment handling that happens
//! at the process boundary.

pub mod env;
pub mod logging;

pub use env::{EnvError, load_dotenv, non_empty_var, resolve_with};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
