//! Application services - use-case orchestration over the ports.

mod chat;
mod knowledge_base;
mod turn;

pub use chat::{ChatError, ChatService, ChatTurn};
pub use knowledge_base::{KnowledgeBaseError, KnowledgeBaseService};
pub use turn::{TurnError, TurnEvent, TurnOutcome, TurnRunner};
