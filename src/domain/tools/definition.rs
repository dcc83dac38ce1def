//! Tool definition - schema and metadata for one capability.

use serde::{Deserialize, Serialize};

/// Definition of a tool the Researcher agent can invoke.
///
/// The description doubles as routing input: the model chooses tools by
/// reading these descriptions, so their wording is part of the system's
/// routing behavior, not mere documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g. "ask_knowledge_base")
    name: String,

    /// Usage description consumed by the model when picking tools
    description: String,

    /// JSON Schema for the parameters
    parameters_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
        }
    }

    /// Creates a definition for a tool that takes no parameters.
    pub fn nullary(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            serde_json::json!({ "type": "object", "properties": {} }),
        )
    }

    /// Creates a definition with a single required string parameter.
    pub fn with_string_param(
        name: impl Into<String>,
        description: impl Into<String>,
        param: &str,
        param_description: &str,
    ) -> Self {
        Self::new(
            name,
            description,
            serde_json::json!({
                "type": "object",
                "required": [param],
                "properties": {
                    param: { "type": "string", "description": param_description }
                }
            }),
        )
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters schema.
    pub fn parameters_schema(&self) -> &serde_json::Value {
        &self.parameters_schema
    }

    /// Returns the names of required parameters declared in the schema.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }

    /// Converts to the OpenAI function-calling wire format.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema
            }
        })
    }
}
