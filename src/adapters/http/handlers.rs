//! HTTP handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::error;

use crate::application::{ChatError, KnowledgeBaseError};
use crate::domain::foundation::{KnowledgeBaseId, SessionId, ValidationError};

use super::dto::*;
use super::routes::AppState;

/// Error envelope shared by every handler.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<KnowledgeBaseError> for ApiError {
    fn from(err: KnowledgeBaseError) -> Self {
        let status = match &err {
            KnowledgeBaseError::NotFound(_) => StatusCode::NOT_FOUND,
            KnowledgeBaseError::AlreadyExists(_) => StatusCode::CONFLICT,
            KnowledgeBaseError::DefaultProtected => StatusCode::FORBIDDEN,
            KnowledgeBaseError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Turn(_) => StatusCode::BAD_GATEWAY,
            ChatError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

fn parse_kb(id: &str) -> Result<KnowledgeBaseId, ApiError> {
    KnowledgeBaseId::new(id).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn parse_session(id: &str) -> Result<SessionId, ApiError> {
    id.parse().map_err(|_| {
        ApiError::bad_request(
            ValidationError::invalid_format("session_id", "not a UUID").to_string(),
        )
    })
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn create_knowledge_base(
    State(state): State<AppState>,
    Json(body): Json<CreateKnowledgeBaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&body.id)?;
    let record = state
        .knowledge_bases
        .create(&id, body.description.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(KnowledgeBaseResponse::from(record)),
    ))
}

pub async fn list_knowledge_bases(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.knowledge_bases.list().await?;
    let response: Vec<KnowledgeBaseResponse> =
        records.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

pub async fn get_knowledge_base(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&id)?;
    let record = state.knowledge_bases.get(&id).await?;
    Ok(Json(KnowledgeBaseResponse::from(record)))
}

pub async fn delete_knowledge_base(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&id)?;
    state.knowledge_bases.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn knowledge_base_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&id)?;
    let stats = state.knowledge_bases.stats(&id).await?;
    Ok(Json(KnowledgeBaseStatsResponse::from(stats)))
}

pub async fn knowledge_base_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&id)?;
    let files = state.knowledge_bases.files(&id).await?;
    let response: Vec<IngestedFileResponse> = files.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

pub async fn knowledge_base_sessions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&id)?;
    let sessions = state.knowledge_bases.sessions(&id).await?;
    let response: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

pub async fn create_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_kb(&id)?;
    let session = state
        .knowledge_bases
        .create_session(&id, body.title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    50
}

pub async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = parse_session(&id)?;
    let messages = state
        .store
        .read_history(&session, query.limit)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let response: Vec<StoredMessageResponse> = messages.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = parse_session(&id)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let turn = state
        .chat
        .send_message(&session, &body.message, Some(&tx))
        .await?;
    drop(tx);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(TurnEventResponse::from(event));
    }

    Ok(Json(SendMessageResponse {
        session: turn.session.to_string(),
        answer: turn.answer,
        research_iterations: turn.research_iterations,
        forced_writer: turn.forced_writer,
        events,
    }))
}
