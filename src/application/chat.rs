//! Chat service - session-scoped question answering.
//!
//! Loads the session's history, runs the turn, and persists the exchange.
//! Only the user message and the final answer are persisted; tool traffic
//! stays turn-internal. Nothing is persisted when the turn fails, so a
//! retry sees the same history as the failed attempt.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::domain::agent::{Message, MessageOrigin, TurnState};
use crate::domain::foundation::SessionId;
use crate::ports::{ConversationStore, StoreError, ToolExecutionContext};

use super::turn::{TurnError, TurnEvent, TurnRunner};

/// Errors the chat service can produce.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The user message was empty or whitespace.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The turn aborted.
    #[error(transparent)]
    Turn(#[from] TurnError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one completed chat exchange.
#[derive(Debug)]
pub struct ChatTurn {
    /// Session the exchange belongs to
    pub session: SessionId,

    /// The final answer
    pub answer: String,

    /// How many Researcher invocations the turn took
    pub research_iterations: usize,

    /// True if the iteration cap forced the Writer
    pub forced_writer: bool,
}

/// Session-scoped question answering over the orchestration graph.
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    runner: TurnRunner,
    history_limit: u32,
    top_k: usize,
}

impl ChatService {
    /// Default number of history messages loaded per turn.
    pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

    /// Creates a chat service.
    pub fn new(store: Arc<dyn ConversationStore>, runner: TurnRunner, top_k: usize) -> Self {
        Self {
            store,
            runner,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            top_k,
        }
    }

    /// Overrides the history window.
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    /// Answers one user message within a session.
    #[instrument(skip(self, text, events), fields(session = %session))]
    pub async fn send_message(
        &self,
        session: &SessionId,
        text: &str,
        events: Option<&mpsc::UnboundedSender<TurnEvent>>,
    ) -> Result<ChatTurn, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let record = self
            .store
            .find_session(session)
            .await?
            .ok_or(ChatError::SessionNotFound(*session))?;

        let history = self.store.read_history(session, self.history_limit).await?;
        let mut messages: Vec<Message> = history
            .into_iter()
            .map(|stored| match stored.origin {
                MessageOrigin::Assistant => Message::assistant(stored.content),
                _ => Message::user(stored.content),
            })
            .collect();
        messages.push(Message::user(text));

        let context =
            ToolExecutionContext::new(record.knowledge_base.clone(), record.id, self.top_k);
        let outcome = self
            .runner
            .run(TurnState::from_messages(messages), &context, events)
            .await?;

        // One transaction: a user message never lands without its answer.
        self.store
            .append_exchange(session, text, &outcome.answer)
            .await?;

        info!(
            iterations = outcome.research_iterations,
            forced = outcome.forced_writer,
            "turn completed"
        );

        Ok(ChatTurn {
            session: *session,
            answer: outcome.answer,
            research_iterations: outcome.research_iterations,
            forced_writer: outcome.forced_writer,
        })
    }
}
