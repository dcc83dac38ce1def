//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::application::TurnEvent;
use crate::ports::{
    IngestedFileRecord, KnowledgeBaseRecord, KnowledgeBaseStats, SessionRecord, StoredMessage,
};

#[derive(Debug, Deserialize)]
pub struct CreateKnowledgeBaseRequest {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KnowledgeBaseResponse {
    pub id: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<KnowledgeBaseRecord> for KnowledgeBaseResponse {
    fn from(record: KnowledgeBaseRecord) -> Self {
        Self {
            id: record.id.to_string(),
            description: record.description,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KnowledgeBaseStatsResponse {
    pub file_count: u32,
    pub chunk_count: u32,
    pub session_count: u32,
}

impl From<KnowledgeBaseStats> for KnowledgeBaseStatsResponse {
    fn from(stats: KnowledgeBaseStats) -> Self {
        Self {
            file_count: stats.file_count,
            chunk_count: stats.chunk_count,
            session_count: stats.session_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestedFileResponse {
    pub file_name: String,
    pub file_type: String,
    pub chunk_count: u32,
    pub ingested_at: String,
}

impl From<IngestedFileRecord> for IngestedFileResponse {
    fn from(record: IngestedFileRecord) -> Self {
        Self {
            file_name: record.file_name,
            file_type: record.file_type,
            chunk_count: record.chunk_count,
            ingested_at: record.ingested_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub knowledge_base: String,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SessionRecord> for SessionResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            knowledge_base: record.knowledge_base.to_string(),
            title: record.title,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoredMessageResponse {
    pub id: String,
    pub origin: String,
    pub content: String,
    pub created_at: String,
}

impl From<StoredMessage> for StoredMessageResponse {
    fn from(message: StoredMessage) -> Self {
        Self {
            id: message.id.to_string(),
            origin: message.origin.label().to_string(),
            content: message.content,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TurnEventResponse {
    pub node: String,
    pub detail: String,
}

impl From<TurnEvent> for TurnEventResponse {
    fn from(event: TurnEvent) -> Self {
        Self {
            node: event.node.to_string(),
            detail: event.detail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub session: String,
    pub answer: String,
    pub research_iterations: usize,
    pub forced_writer: bool,
    pub events: Vec<TurnEventResponse>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
