//! Knowledge base service - lifecycle of knowledge bases and their sessions.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::foundation::KnowledgeBaseId;
use crate::ports::{
    ConversationStore, IngestedFileRecord, KnowledgeBaseRecord, KnowledgeBaseStats,
    SessionRecord, StoreError,
};

/// Errors the knowledge base service can produce.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// The named knowledge base does not exist.
    #[error("knowledge base not found: {0}")]
    NotFound(KnowledgeBaseId),

    /// A knowledge base with this id already exists.
    #[error("knowledge base already exists: {0}")]
    AlreadyExists(KnowledgeBaseId),

    /// The default knowledge base cannot be deleted.
    #[error("the default knowledge base cannot be deleted")]
    DefaultProtected,

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Manages knowledge bases and the sessions attached to them.
pub struct KnowledgeBaseService {
    store: Arc<dyn ConversationStore>,
}

impl KnowledgeBaseService {
    /// Creates the service.
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Ensures the default knowledge base exists. Idempotent; called at
    /// startup.
    pub async fn ensure_default(&self) -> Result<(), KnowledgeBaseError> {
        let default = KnowledgeBaseId::default_kb();
        if self.store.find_knowledge_base(&default).await?.is_none() {
            self.store
                .create_knowledge_base(&default, Some("Default knowledge base"))
                .await?;
            info!("created default knowledge base");
        }
        Ok(())
    }

    /// Creates a knowledge base.
    #[instrument(skip(self, description), fields(kb = %id))]
    pub async fn create(
        &self,
        id: &KnowledgeBaseId,
        description: Option<&str>,
    ) -> Result<KnowledgeBaseRecord, KnowledgeBaseError> {
        if self.store.find_knowledge_base(id).await?.is_some() {
            return Err(KnowledgeBaseError::AlreadyExists(id.clone()));
        }
        let record = self.store.create_knowledge_base(id, description).await?;
        info!("knowledge base created");
        Ok(record)
    }

    /// Lists every knowledge base.
    pub async fn list(&self) -> Result<Vec<KnowledgeBaseRecord>, KnowledgeBaseError> {
        Ok(self.store.list_knowledge_bases().await?)
    }

    /// Returns one knowledge base.
    pub async fn get(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<KnowledgeBaseRecord, KnowledgeBaseError> {
        self.store
            .find_knowledge_base(id)
            .await?
            .ok_or_else(|| KnowledgeBaseError::NotFound(id.clone()))
    }

    /// Deletes a knowledge base and everything scoped to it. The default
    /// knowledge base is protected.
    #[instrument(skip(self), fields(kb = %id))]
    pub async fn delete(&self, id: &KnowledgeBaseId) -> Result<(), KnowledgeBaseError> {
        if id.is_default() {
            return Err(KnowledgeBaseError::DefaultProtected);
        }
        if self.store.find_knowledge_base(id).await?.is_none() {
            return Err(KnowledgeBaseError::NotFound(id.clone()));
        }
        self.store.delete_knowledge_base(id).await?;
        info!("knowledge base deleted");
        Ok(())
    }

    /// Returns aggregate counts for a knowledge base.
    pub async fn stats(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<KnowledgeBaseStats, KnowledgeBaseError> {
        self.get(id).await?;
        Ok(self.store.knowledge_base_stats(id).await?)
    }

    /// Lists the files ingested into a knowledge base.
    pub async fn files(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<Vec<IngestedFileRecord>, KnowledgeBaseError> {
        self.get(id).await?;
        Ok(self.store.files_for_knowledge_base(id).await?)
    }

    /// Records a file ingested into a knowledge base.
    pub async fn record_file(
        &self,
        id: &KnowledgeBaseId,
        file_name: &str,
        file_type: &str,
        chunk_count: u32,
    ) -> Result<IngestedFileRecord, KnowledgeBaseError> {
        self.get(id).await?;
        Ok(self
            .store
            .record_ingested_file(id, file_name, file_type, chunk_count)
            .await?)
    }

    /// Lists the sessions of a knowledge base, most recently updated first.
    pub async fn sessions(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<Vec<SessionRecord>, KnowledgeBaseError> {
        self.get(id).await?;
        Ok(self.store.sessions_for_knowledge_base(id).await?)
    }

    /// Creates a new session bound to a knowledge base.
    pub async fn create_session(
        &self,
        id: &KnowledgeBaseId,
        title: Option<&str>,
    ) -> Result<SessionRecord, KnowledgeBaseError> {
        self.get(id).await?;
        Ok(self.store.create_session(id, title).await?)
    }

    /// Returns the most recent session of a knowledge base, creating one if
    /// none exists.
    pub async fn get_or_create_session(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<SessionRecord, KnowledgeBaseError> {
        self.get(id).await?;
        match self.store.latest_session_for_knowledge_base(id).await? {
            Some(session) => Ok(session),
            None => Ok(self.store.create_session(id, None).await?),
        }
    }
}
