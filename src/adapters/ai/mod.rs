//! Model caller adapters.

mod mock_caller;
mod openai_caller;

pub use mock_caller::{CapturedCall, MockModelCaller};
pub use openai_caller::OpenAiModelCaller;
