//! Ports - trait boundaries between the application core and the adapters.
//!
//! The application layer depends only on these traits; concrete model
//! providers, retrieval backends, storage engines, and tool suites plug in
//! from `adapters`.

mod conversation_store;
mod knowledge_retriever;
mod model_caller;
mod tool_executor;

pub use conversation_store::{
    ConversationStore, IngestedFileRecord, KnowledgeBaseRecord, KnowledgeBaseStats,
    SessionRecord, StoreError, StoredMessage,
};
pub use knowledge_retriever::{KnowledgeRetriever, RetrievalError, RetrievedPassage};
pub use model_caller::{ModelCaller, ModelError};
pub use tool_executor::{ToolExecutionContext, ToolExecutionError, ToolExecutor};
