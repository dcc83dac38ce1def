//! Route table and shared application state.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::{ChatService, KnowledgeBaseService};
use crate::ports::ConversationStore;

use super::handlers;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub knowledge_bases: Arc<KnowledgeBaseService>,
    pub store: Arc<dyn ConversationStore>,
}

/// Builds the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/knowledge-bases",
            get(handlers::list_knowledge_bases).post(handlers::create_knowledge_base),
        )
        .route(
            "/api/knowledge-bases/:id",
            get(handlers::get_knowledge_base).delete(handlers::delete_knowledge_base),
        )
        .route(
            "/api/knowledge-bases/:id/stats",
            get(handlers::knowledge_base_stats),
        )
        .route(
            "/api/knowledge-bases/:id/files",
            get(handlers::knowledge_base_files),
        )
        .route(
            "/api/knowledge-bases/:id/sessions",
            get(handlers::knowledge_base_sessions).post(handlers::create_session),
        )
        .route("/api/sessions/:id/history", get(handlers::session_history))
        .route("/api/sessions/:id/messages", post(handlers::send_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
