//! Scripted model caller for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::agent::Message;
use crate::domain::tools::ToolDefinition;
use crate::ports::{ModelCaller, ModelError};

/// One invocation captured by the mock, for assertion in tests.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    /// Messages handed to the model
    pub messages: Vec<Message>,

    /// Tool definitions offered, if any
    pub tools: Option<Vec<ToolDefinition>>,
}

/// A model caller that replays a scripted queue of replies.
///
/// Each `invoke` pops the next queued result; an exhausted queue yields
/// `ModelError::Unavailable` so a mis-scripted test fails loudly instead of
/// hanging.
#[derive(Default)]
pub struct MockModelCaller {
    replies: Mutex<VecDeque<Result<Message, ModelError>>>,
    captured: Mutex<Vec<CapturedCall>>,
}

impl MockModelCaller {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next reply.
    pub fn enqueue(&self, reply: Result<Message, ModelError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Returns every invocation made so far.
    pub fn captured_calls(&self) -> Vec<CapturedCall> {
        self.captured.lock().unwrap().clone()
    }

    /// Returns how many invocations were made.
    pub fn call_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelCaller for MockModelCaller {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Message, ModelError> {
        self.captured.lock().unwrap().push(CapturedCall {
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Unavailable("mock reply queue empty".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queue_in_order() {
        let mock = MockModelCaller::new();
        mock.enqueue(Ok(Message::assistant("first")));
        mock.enqueue(Ok(Message::assistant("second")));

        let a = mock.invoke(&[Message::user("q")], None).await.unwrap();
        let b = mock.invoke(&[Message::user("q")], None).await.unwrap();
        assert_eq!(a.content(), "first");
        assert_eq!(b.content(), "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_queue_yields_unavailable() {
        let mock = MockModelCaller::new();
        let result = mock.invoke(&[Message::user("q")], None).await;
        assert!(matches!(result, Err(ModelError::Unavailable(_))));
    }

    #[tokio::test]
    async fn captures_offered_tools() {
        let mock = MockModelCaller::new();
        mock.enqueue(Ok(Message::assistant("ok")));

        let tools = vec![ToolDefinition::nullary("get_current_time", "UTC time")];
        mock.invoke(&[Message::user("q")], Some(tools.as_slice()))
            .await
            .unwrap();

        let captured = mock.captured_calls();
        assert_eq!(captured[0].tools.as_ref().unwrap().len(), 1);
    }
}
