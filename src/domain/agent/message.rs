//! Message value object - one immutable record in the turn transcript.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ToolCallId;
use crate::domain::tools::ToolCall;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    /// User input.
    User,
    /// Model reply (Researcher or Writer).
    Assistant,
    /// Result of a tool invocation.
    Tool,
    /// System directive (never persisted, prepended per model call).
    System,
}

impl MessageOrigin {
    /// Stable lowercase label, used for transcripts and persistence.
    pub fn label(&self) -> &'static str {
        match self {
            MessageOrigin::User => "user",
            MessageOrigin::Assistant => "assistant",
            MessageOrigin::Tool => "tool",
            MessageOrigin::System => "system",
        }
    }

    /// Parses a label produced by [`MessageOrigin::label`].
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "user" => Some(MessageOrigin::User),
            "assistant" => Some(MessageOrigin::Assistant),
            "tool" => Some(MessageOrigin::Tool),
            "system" => Some(MessageOrigin::System),
            _ => None,
        }
    }
}

/// An immutable record of one transcript entry.
///
/// `content` may be empty when the message is purely a tool-invocation
/// request; `tool_call_id` is present only on tool-result messages and
/// correlates the result to the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    origin: MessageOrigin,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<ToolCallId>,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            origin: MessageOrigin::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            origin: MessageOrigin::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant message carrying tool-invocation requests.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            origin: MessageOrigin::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Creates a tool-result message correlated to its originating request.
    pub fn tool_result(tool_call_id: ToolCallId, content: impl Into<String>) -> Self {
        Self {
            origin: MessageOrigin::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id),
        }
    }

    /// Creates a system directive message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            origin: MessageOrigin::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Returns the origin.
    pub fn origin(&self) -> MessageOrigin {
        self.origin
    }

    /// Returns the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the requested tool invocations, in request order.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    /// Returns true if this message requests at least one tool invocation.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Returns the correlation id (tool-result messages only).
    pub fn tool_call_id(&self) -> Option<&ToolCallId> {
        self.tool_call_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ToolCallId;

    #[test]
    fn user_message_has_no_tool_calls() {
        let msg = Message::user("What is in the knowledge base?");
        assert_eq!(msg.origin(), MessageOrigin::User);
        assert!(!msg.has_tool_calls());
        assert!(msg.tool_call_id().is_none());
    }

    #[test]
    fn assistant_with_tool_calls_preserves_request_order() {
        let calls = vec![
            ToolCall::generate("get_current_time", serde_json::json!({})),
            ToolCall::generate("calculate_expression", serde_json::json!({"expression": "2+2"})),
        ];
        let msg = Message::assistant_with_tool_calls("", calls);

        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls()[0].name(), "get_current_time");
        assert_eq!(msg.tool_calls()[1].name(), "calculate_expression");
        assert!(msg.content().is_empty());
    }

    #[test]
    fn tool_result_carries_correlation_id() {
        let id = ToolCallId::new("call_xyz").unwrap();
        let msg = Message::tool_result(id.clone(), "3 files: a.pdf, b.md, c.txt");

        assert_eq!(msg.origin(), MessageOrigin::Tool);
        assert_eq!(msg.tool_call_id(), Some(&id));
        assert_eq!(msg.content(), "3 files: a.pdf, b.md, c.txt");
    }

    #[test]
    fn origin_labels_round_trip() {
        for origin in [
            MessageOrigin::User,
            MessageOrigin::Assistant,
            MessageOrigin::Tool,
            MessageOrigin::System,
        ] {
            assert_eq!(MessageOrigin::parse(origin.label()), Some(origin));
        }
        assert_eq!(MessageOrigin::parse("unknown"), None);
    }

    #[test]
    fn origin_serializes_lowercase() {
        let json = serde_json::to_string(&MessageOrigin::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn plain_message_serializes_without_tool_fields() {
        let msg = Message::assistant("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
    }
}
