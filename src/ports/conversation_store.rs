//! Conversation store port - persistence for knowledge bases, sessions,
//! chat history, and ingested-file metadata.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::agent::MessageOrigin;
use crate::domain::foundation::{KnowledgeBaseId, MessageId, SessionId, Timestamp};

/// A knowledge base known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseRecord {
    pub id: KnowledgeBaseId,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// A chat session bound to one knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub knowledge_base: KnowledgeBaseId,
    pub title: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One persisted chat message.
///
/// Only user and assistant messages are persisted; tool traffic and system
/// directives are turn-internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub session: SessionId,
    pub origin: MessageOrigin,
    pub content: String,
    pub created_at: Timestamp,
}

/// Metadata for a file ingested into a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedFileRecord {
    pub knowledge_base: KnowledgeBaseId,
    pub file_name: String,
    /// File kind as ingested, e.g. "pdf" or "markdown".
    pub file_type: String,
    pub chunk_count: u32,
    pub ingested_at: Timestamp,
}

/// Aggregate counts for one knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseStats {
    pub file_count: u32,
    pub chunk_count: u32,
    pub session_count: u32,
}

/// Errors the store can produce.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint was violated.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// The underlying database failed.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(entity: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    /// Wraps a database failure.
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Persistence boundary for every durable entity of the system.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates a knowledge base. Fails if the id already exists.
    async fn create_knowledge_base(
        &self,
        id: &KnowledgeBaseId,
        description: Option<&str>,
    ) -> Result<KnowledgeBaseRecord, StoreError>;

    /// Lists every knowledge base, oldest first.
    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>, StoreError>;

    /// Returns one knowledge base, if it exists.
    async fn find_knowledge_base(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBaseRecord>, StoreError>;

    /// Deletes a knowledge base and everything scoped to it (sessions,
    /// messages, file records) in one transaction.
    async fn delete_knowledge_base(&self, id: &KnowledgeBaseId) -> Result<(), StoreError>;

    /// Returns aggregate counts for one knowledge base.
    async fn knowledge_base_stats(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<KnowledgeBaseStats, StoreError>;

    /// Creates a session bound to a knowledge base.
    async fn create_session(
        &self,
        knowledge_base: &KnowledgeBaseId,
        title: Option<&str>,
    ) -> Result<SessionRecord, StoreError>;

    /// Returns one session, if it exists.
    async fn find_session(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    /// Lists sessions of a knowledge base, most recently updated first.
    async fn sessions_for_knowledge_base(
        &self,
        knowledge_base: &KnowledgeBaseId,
    ) -> Result<Vec<SessionRecord>, StoreError>;

    /// Returns the most recently updated session of a knowledge base.
    async fn latest_session_for_knowledge_base(
        &self,
        knowledge_base: &KnowledgeBaseId,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Appends one message to a session's history and bumps the session's
    /// `updated_at`.
    async fn append_message(
        &self,
        session: &SessionId,
        origin: MessageOrigin,
        content: &str,
    ) -> Result<StoredMessage, StoreError>;

    /// Appends a user message and the assistant's answer atomically. Either
    /// both land in the history or neither does.
    async fn append_exchange(
        &self,
        session: &SessionId,
        user_content: &str,
        assistant_content: &str,
    ) -> Result<(StoredMessage, StoredMessage), StoreError>;

    /// Reads a session's history in append order, capped at `limit`
    /// most-recent messages.
    async fn read_history(
        &self,
        session: &SessionId,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, StoreError>;

    /// Records a file ingested into a knowledge base. Re-ingesting the same
    /// file name replaces the earlier record.
    async fn record_ingested_file(
        &self,
        knowledge_base: &KnowledgeBaseId,
        file_name: &str,
        file_type: &str,
        chunk_count: u32,
    ) -> Result<IngestedFileRecord, StoreError>;

    /// Lists the files ingested into a knowledge base, newest first.
    async fn files_for_knowledge_base(
        &self,
        knowledge_base: &KnowledgeBaseId,
    ) -> Result<Vec<IngestedFileRecord>, StoreError>;
}
