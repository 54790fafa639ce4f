//! Caller-owned conversation context
//!
//! Each utterance borrows the context for its completion request; the caller
//! appends the reply afterwards and applies the trimming policy explicitly.

use serde::Serialize;

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Conversation-seeding instructions
    System,
    /// The human side
    User,
    /// The model side
    Assistant,
}

/// One conversation message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a message
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Bounded conversation history owned by the caller
#[derive(Debug, Clone)]
pub struct ConversationContext {
    messages: Vec<ChatMessage>,
}

impl ConversationContext {
    /// Create a context seeded with a system prompt
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::System, system_prompt)],
        }
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(Role::User, content));
    }

    /// Append an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(Role::Assistant, content));
    }

    /// All messages, in order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Apply the trimming policy in place
    pub fn trim(&mut self, window: usize) {
        self.messages = trim_history(&self.messages, window);
    }
}

/// Trimming policy: keep the leading system entry plus the last `window`
/// messages
///
/// Pure function returning the new bounded sequence; the input is unchanged.
#[must_use]
pub fn trim_history(messages: &[ChatMessage], window: usize) -> Vec<ChatMessage> {
    let Some((first, rest)) = messages.split_first() else {
        return Vec::new();
    };
    if rest.len() <= window {
        return messages.to_vec();
    }
    let mut trimmed = Vec::with_capacity(window + 1);
    trimmed.push(first.clone());
    trimmed.extend_from_slice(&rest[rest.len() - window..]);
    trimmed
}
