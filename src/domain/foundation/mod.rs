//! Foundation types shared across the domain.
//!
//! Identifier newtypes, the error vocabulary, and the timestamp value object.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{KnowledgeBaseId, MessageId, SessionId, ToolCallId};
pub use timestamp::Timestamp;
