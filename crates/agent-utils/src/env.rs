//! Environment helpers for the process boundary
//!
//! Only binaries and configuration loaders call into this module; library
//! code receives explicit configuration structs instead.

use regex::{Captures, Regex};
use thiserror::Error;

lazy_static::lazy_static! {
    /// `${VAR}` in group 1 or `$VAR` in group 2
    static ref VAR_REFERENCE: Regex =
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("variable reference pattern is valid");
}

/// Errors raised while reading the environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// A referenced variable is not set
    #[error("Environment variable not found: {0}")]
    NotFound(String),
}

/// Load a `.env` file from the working directory or its parents, if any
///
/// Returns the path that was loaded. A missing file is not an error.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::debug!("No .env file loaded: {}", e);
            None
        }
    }
}

/// Read a variable, treating unset and blank the same way
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expand `${VAR}` and `$VAR` references in one pass
///
/// Substituted values are not scanned again. The first missing variable is
/// reported.
pub fn resolve_with<F>(s: &str, lookup: F) -> Result<String, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = None;

    let resolved = VAR_REFERENCE.replace_all(s, |cap: &Captures<'_>| {
        let name = cap
            .get(1)
            .or_else(|| cap.get(2))
            .map_or("", |m| m.as_str());
        match lookup(name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(EnvError::NotFound(name)),
        None => Ok(resolved.into_owned()),
    }
}
