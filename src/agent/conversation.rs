//! Conversation transcript
//!
//! One flat, ordered sequence of role-tagged messages per session.

use crate::core::{Message, Role, ToolInvocation};

/// Ordered conversation history for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript that opens with a system message
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// All messages, system prompt included
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The system prompt, if the transcript opens with one
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.text())
    }

    /// Marker to roll back to if a turn fails
    pub fn checkpoint(&self) -> usize {
        self.messages.len()
    }

    /// Drop everything appended after `checkpoint`
    pub fn rollback(&mut self, checkpoint: usize) {
        self.messages.truncate(checkpoint);
    }

    /// Clear history, keeping the system prompt
    pub fn clear(&mut self) {
        let keep = usize::from(self.system_prompt().is_some());
        self.messages.truncate(keep);
    }

    /// Get the last user message
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Get the last assistant message that carries text
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.content.is_some())
    }

    /// Invocations of the latest tool request that have no result yet
    pub fn pending_invocations(&self) -> Vec<&ToolInvocation> {
        let Some(request_at) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant && !m.invocations().is_empty())
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[request_at + 1..]
            .iter()
            .filter_map(|m| m.tool_result_id.as_deref())
            .collect();

        self.messages[request_at]
            .invocations()
            .iter()
            .filter(|inv| !answered.contains(&inv.id.as_str()))
            .collect()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
