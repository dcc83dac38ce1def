//! Tool executor port - runs one tool-invocation request.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{KnowledgeBaseId, SessionId};
use crate::domain::tools::{ToolCall, ToolDefinition};

/// Per-turn context handed to every tool execution.
///
/// Carrying the knowledge base and session here lets one executor instance
/// serve every concurrent turn without per-turn construction.
#[derive(Debug, Clone)]
pub struct ToolExecutionContext {
    knowledge_base: KnowledgeBaseId,
    session: SessionId,
    top_k: usize,
}

impl ToolExecutionContext {
    /// Creates a new execution context.
    pub fn new(knowledge_base: KnowledgeBaseId, session: SessionId, top_k: usize) -> Self {
        Self {
            knowledge_base,
            session,
            top_k,
        }
    }

    /// Returns the knowledge base this turn targets.
    pub fn knowledge_base(&self) -> &KnowledgeBaseId {
        &self.knowledge_base
    }

    /// Returns the session this turn belongs to.
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Returns the retrieval depth for semantic lookups.
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// Errors a tool execution can produce.
#[derive(Debug, Error)]
pub enum ToolExecutionError {
    /// The requested tool is not part of the suite.
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    /// The arguments do not satisfy the tool's schema.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool ran but failed.
    #[error("tool {tool} failed: {reason}")]
    Failed { tool: String, reason: String },
}

impl ToolExecutionError {
    /// Creates an invalid-arguments error.
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Creates an execution-failure error.
    pub fn failed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Executes tool-invocation requests against a concrete tool suite.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the definitions of every tool this executor can run.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Returns true if the named tool is part of the suite.
    fn has_tool(&self, name: &str) -> bool;

    /// Runs one tool call and returns its textual result.
    async fn execute(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_exposes_turn_scope() {
        let kb = KnowledgeBaseId::default_kb();
        let session = SessionId::new();
        let ctx = ToolExecutionContext::new(kb.clone(), session, 3);

        assert_eq!(ctx.knowledge_base(), &kb);
        assert_eq!(ctx.top_k(), 3);
    }

    #[test]
    fn errors_render_tool_name() {
        let err = ToolExecutionError::failed("calculate_expression", "division by zero");
        assert_eq!(
            err.to_string(),
            "tool calculate_expression failed: division by zero"
        );

        let err = ToolExecutionError::ToolNotFound("no_such_tool".into());
        assert_eq!(err.to_string(), "unknown tool: no_such_tool");
    }
}
