//! Tool Registry - definition catalog passed wholesale to the model binding.
//!
//! Dispatch by name stays a plain lookup; the model's reasoning over the
//! descriptions is what actually routes between tools.

use std::collections::HashMap;

use super::ToolDefinition;

/// Catalog of every tool the Researcher may request.
///
/// Registration order is preserved so the system directive and the model
/// binding always enumerate tools in the same, stable order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// All registered tools by name
    tools: HashMap<String, ToolDefinition>,

    /// Registration order
    order: Vec<String>,
}

impl ToolRegistry {
    /// Creates a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A duplicate name replaces the earlier definition.
    pub fn register(&mut self, definition: ToolDefinition) {
        let name = definition.name().to_string();
        if self.tools.insert(name.clone(), definition).is_none() {
            self.order.push(name);
        }
    }

    /// Gets a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Checks if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns all definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).cloned())
            .collect()
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Converts all tools to the OpenAI function-calling wire format.
    pub fn to_openai_tools(&self) -> Vec<serde_json::Value> {
        self.definitions()
            .iter()
            .map(|tool| tool.to_openai_format())
            .collect()
    }
}
