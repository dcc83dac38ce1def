//! Orchestration graph - node identities and the routing predicate.
//!
//! # Design
//!
//! Routing never inspects message content or the advisory `next_step` hint.
//! The sole input is whether the last message carries tool calls: an
//! assistant message with tool calls routes to the Tool-Executor, anything
//! else after the Researcher routes to the Writer, and the Tool-Executor
//! always hands control back to the Researcher. This keeps the graph a pure
//! function of observable state and trivially testable.

use super::state::TurnState;

/// A node of the two-agent orchestration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphNode {
    /// Gathers facts, deciding which tools to invoke.
    Researcher,
    /// Executes every tool call requested by the Researcher.
    ToolExecutor,
    /// Synthesizes the final answer from the transcript.
    Writer,
    /// Terminal node; the turn is complete.
    Done,
}

impl GraphNode {
    /// Stable lowercase label for logging and event reporting.
    pub fn label(&self) -> &'static str {
        match self {
            GraphNode::Researcher => "researcher",
            GraphNode::ToolExecutor => "tool_executor",
            GraphNode::Writer => "writer",
            GraphNode::Done => "done",
        }
    }

    /// Returns true once the turn has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GraphNode::Done)
    }
}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Computes the node that runs after `current`, given the turn state.
///
/// Pure: reads only the last message of the log.
pub fn next_node(current: GraphNode, state: &TurnState) -> GraphNode {
    match current {
        GraphNode::Researcher => {
            let wants_tools = state
                .last_message()
                .map(|m| m.has_tool_calls())
                .unwrap_or(false);
            if wants_tools {
                GraphNode::ToolExecutor
            } else {
                GraphNode::Writer
            }
        }
        // Results always return to the Researcher for assessment, even when
        // every tool in the batch failed.
        GraphNode::ToolExecutor => GraphNode::Researcher,
        GraphNode::Writer => GraphNode::Done,
        GraphNode::Done => GraphNode::Done,
    }
}
