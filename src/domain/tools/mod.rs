//! Tool descriptors and the definition registry.
//!
//! Tools are the capabilities the Researcher agent can request. Each one
//! advertises a name, a natural-language usage description (read by the
//! model to decide applicability), and a JSON-Schema parameter list. Actual
//! execution lives behind the `ToolExecutor` port; this module is schema only.

mod call;
mod definition;
mod registry;

pub use call::ToolCall;
pub use definition::ToolDefinition;
pub use registry::ToolRegistry;
