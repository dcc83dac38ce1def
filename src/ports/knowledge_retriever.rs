//! Knowledge retriever port - semantic lookup over a knowledge base.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::KnowledgeBaseId;

/// One passage returned by a retrieval query, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text
    pub text: String,

    /// Source document the passage came from
    pub source: String,

    /// Relevance score, higher is better
    pub score: f64,
}

/// Errors a retrieval backend can produce.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The named knowledge base does not exist in the backend.
    #[error("knowledge base not found: {0}")]
    KnowledgeBaseNotFound(String),

    /// The backend failed to serve the query.
    #[error("retrieval backend error: {0}")]
    Backend(String),
}

/// Retrieves the passages most relevant to a query.
///
/// An empty result is a normal outcome, not an error: it means the
/// knowledge base holds nothing relevant.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn query(
        &self,
        query: &str,
        knowledge_base: &KnowledgeBaseId,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError>;
}
