//! Message types for LLM communication
//!
//! Research prompts are plain text, so a message is a role plus a string.
//! Providers translate this into their own wire format.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (sent out of band by some providers)
    System,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Check if the message carries no visible text
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Message::user("Hello").role, Role::User);
        assert_eq!(Message::assistant("Hi").role, Role::Assistant);
        assert_eq!(Message::system("Rules").role.as_str(), "system");
    }

    #[test]
    fn test_blank_detection() {
        assert!(Message::assistant(" \n").is_blank());
        assert!(!Message::assistant("report").is_blank());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::user("Test")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Test"}"#);
    }
}
