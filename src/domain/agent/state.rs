//! Turn state - the append-only message log shared by all graph nodes.

use crate::domain::tools::ToolCall;

use super::message::Message;

/// Accumulated state for one turn of the orchestration graph.
///
/// Nodes never mutate or remove earlier messages; each node contributes by
/// appending. `next_step` mirrors the advisory routing hint the nodes emit,
/// but actual routing derives from the last message alone.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    messages: Vec<Message>,
    next_step: Option<String>,
}

impl TurnState {
    /// Creates an empty turn state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state seeded with prior history and the current user message.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            next_step: None,
        }
    }

    /// Appends one message to the log.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends a batch of messages in order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Records the advisory routing hint emitted by a node.
    pub fn set_next_step(&mut self, step: impl Into<String>) {
        self.next_step = Some(step.into());
    }

    /// Returns the advisory routing hint, if any node has emitted one.
    pub fn next_step(&self) -> Option<&str> {
        self.next_step.as_deref()
    }

    /// Returns the full message log in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recently appended message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the tool calls requested by the last message, if it is an
    /// assistant message carrying any. Empty otherwise.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.last_message()
            .map(|m| m.tool_calls())
            .unwrap_or(&[])
    }

    /// Returns the number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
