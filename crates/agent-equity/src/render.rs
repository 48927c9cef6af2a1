//! Plain-text rendering of digest outcomes

use crate::outcome::{Error, Outcome};

/// Render an error as a header line plus one line per failed backend
///
/// Backends that answered with blank text follow on a line of their own.
pub fn render_error(error: &Error) -> String {
    let mut out = format!("Error [{}]: {}", error.code, error.message);
    for (agent, description) in &error.details {
        out.push_str(&format!("\n  - {agent}: {description}"));
    }
    if !error.blank_answers.is_empty() {
        out.push_str(&format!(
            "\nBlank answers from: {}",
            error.blank_answers.join(", ")
        ));
    }
    out
}

/// Render an outcome; successful text is returned as is
pub fn render_outcome(outcome: &Outcome<String>) -> String {
    match outcome {
        Ok(text) => text.clone(),
        Err(error) => render_error(error),
    }
}
