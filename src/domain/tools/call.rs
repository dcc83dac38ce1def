//! Tool invocation request value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ToolCallId;

/// A request, emitted by the model, to invoke a named tool with arguments.
///
/// The id correlates the eventual tool-result message back to this request,
/// so results stay attributable even if a future implementation reorders
/// execution within a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation identifier for the result message
    id: ToolCallId,

    /// Name of the tool to invoke
    name: String,

    /// Arguments for the tool (JSON object)
    arguments: serde_json::Value,
}

impl ToolCall {
    /// Creates a new tool call with a provider-issued id.
    pub fn new(id: ToolCallId, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id,
            name: name.into(),
            arguments,
        }
    }

    /// Creates a tool call with a freshly generated id (tests, local tools).
    pub fn generate(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::new(ToolCallId::generate(), name, arguments)
    }

    /// Returns the correlation id.
    pub fn id(&self) -> &ToolCallId {
        &self.id
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments.
    pub fn arguments(&self) -> &serde_json::Value {
        &self.arguments
    }

    /// Returns a named string argument, if present.
    pub fn string_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}
