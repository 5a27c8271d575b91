//! Chat Completion API
//!
//! Conversation messages and the streaming completion request body.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in a chat conversation
///
/// A conversation is a `Vec<Message>` in chronological order. Messages are
/// never edited in place: a new turn produces a new vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Streaming chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    /// Model identifier
    pub model: &'a str,

    /// Messages in the conversation
    pub messages: &'a [Message],

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Always true; the response is decoded incrementally
    pub stream: bool,
}

impl<'a> CompletionRequest<'a> {
    /// Create a new streaming completion request
    pub fn new(model: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            messages,
            temperature: None,
            stream: true,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}
