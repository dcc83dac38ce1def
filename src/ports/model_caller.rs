//! Model caller port - one chat completion per invocation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::agent::Message;
use crate::domain::tools::ToolDefinition;

/// Errors a model invocation can produce.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Rate limited by the provider.
    #[error("rate limited by model provider")]
    RateLimited,

    /// The conversation exceeds the model's context window.
    #[error("conversation exceeds model context window")]
    ContextTooLong,

    /// The provider returned a server-side failure.
    #[error("model provider unavailable: {0}")]
    Unavailable(String),

    /// Authentication with the provider failed.
    #[error("model provider authentication failed")]
    AuthenticationFailed,

    /// Network-level failure reaching the provider.
    #[error("network error calling model provider: {0}")]
    Network(String),

    /// The provider's response could not be parsed.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// The request was rejected as malformed.
    #[error("invalid model request: {0}")]
    InvalidRequest(String),

    /// The invocation exceeded the configured deadline.
    #[error("model invocation timed out after {0} seconds")]
    Timeout(u64),
}

impl ModelError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::RateLimited
                | ModelError::Unavailable(_)
                | ModelError::Network(_)
                | ModelError::Timeout(_)
        )
    }
}

/// Invokes a chat model once and returns its reply message.
///
/// When `tools` is `Some`, the model may answer with tool-invocation
/// requests; when `None`, the call is plain-text only (Writer mode).
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Message, ModelError>;
}
