//! Agent orchestration core.
//!
//! One user turn is driven through a small state machine: the Researcher
//! gathers facts by requesting tools, the Tool-Executor runs them, and the
//! Writer synthesizes the final answer from the accumulated message log.
//! The log is strictly append-only; routing is a pure function of the last
//! message.

mod graph;
mod message;
pub mod prompts;
mod state;

pub use graph::{next_node, GraphNode};
pub use message::{Message, MessageOrigin};
pub use state::TurnState;
