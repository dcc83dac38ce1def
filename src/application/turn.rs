//! Turn runner - drives one user turn through the orchestration graph.
//!
//! # Design
//!
//! The runner walks the graph node by node: each node appends its
//! contribution to the turn state and the routing predicate picks the next
//! node from the last message alone. Tool failures are converted into
//! error-text tool results and fed back to the Researcher; only model
//! failures abort the turn.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::agent::{next_node, prompts, GraphNode, Message, TurnState};
use crate::ports::{ModelCaller, ModelError, ToolExecutionContext, ToolExecutor};

/// A progress event emitted as the turn moves through the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEvent {
    /// Label of the node that just ran
    pub node: &'static str,

    /// Human-readable summary of what the node did
    pub detail: String,
}

impl TurnEvent {
    fn new(node: GraphNode, detail: impl Into<String>) -> Self {
        Self {
            node: node.label(),
            detail: detail.into(),
        }
    }
}

/// Result of a completed turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The Writer's final answer
    pub answer: String,

    /// The full turn state, including every intermediate message
    pub state: TurnState,

    /// How many Researcher invocations the turn took
    pub research_iterations: usize,

    /// True if the iteration cap forced the Writer to run
    pub forced_writer: bool,
}

/// Errors that abort a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// A model invocation failed after retries.
    #[error("model invocation failed: {0}")]
    Model(#[from] ModelError),
}

/// Drives one turn through Researcher, Tool-Executor, and Writer.
pub struct TurnRunner {
    model: Arc<dyn ModelCaller>,
    tools: Arc<dyn ToolExecutor>,
    max_research_iterations: usize,
}

impl TurnRunner {
    /// Default cap on Researcher invocations per turn.
    pub const DEFAULT_MAX_RESEARCH_ITERATIONS: usize = 8;

    /// Creates a runner with the default iteration cap.
    pub fn new(model: Arc<dyn ModelCaller>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            model,
            tools,
            max_research_iterations: Self::DEFAULT_MAX_RESEARCH_ITERATIONS,
        }
    }

    /// Overrides the Researcher iteration cap.
    pub fn with_max_research_iterations(mut self, cap: usize) -> Self {
        self.max_research_iterations = cap.max(1);
        self
    }

    /// Runs a turn to completion.
    ///
    /// `state` must already contain the conversation history and the current
    /// user message. `events`, when present, receives one event per executed
    /// node; a dropped receiver never aborts the turn.
    pub async fn run(
        &self,
        mut state: TurnState,
        context: &ToolExecutionContext,
        events: Option<&mpsc::UnboundedSender<TurnEvent>>,
    ) -> Result<TurnOutcome, TurnError> {
        let definitions = self.tools.definitions();
        let mut current = GraphNode::Researcher;
        let mut research_iterations = 0usize;
        let mut forced_writer = false;

        loop {
            match current {
                GraphNode::Researcher => {
                    if research_iterations >= self.max_research_iterations {
                        warn!(
                            cap = self.max_research_iterations,
                            "research iteration cap reached, forcing writer"
                        );
                        forced_writer = true;
                        emit(
                            events,
                            TurnEvent::new(
                                GraphNode::Researcher,
                                "iteration cap reached, handing off to writer",
                            ),
                        );
                        current = GraphNode::Writer;
                        continue;
                    }

                    research_iterations += 1;

                    // The directive is ephemeral: prepended for this call
                    // only, never appended to the turn state.
                    let directive = Message::system(prompts::researcher_directive(&definitions));
                    let mut call_messages = Vec::with_capacity(state.len() + 1);
                    call_messages.push(directive);
                    call_messages.extend(state.messages().iter().cloned());

                    let reply = self
                        .model
                        .invoke(&call_messages, Some(definitions.as_slice()))
                        .await?;
                    debug!(
                        iteration = research_iterations,
                        tool_calls = reply.tool_calls().len(),
                        "researcher replied"
                    );
                    emit(
                        events,
                        TurnEvent::new(
                            GraphNode::Researcher,
                            if reply.has_tool_calls() {
                                format!("requested {} tool call(s)", reply.tool_calls().len())
                            } else {
                                "research complete".to_string()
                            },
                        ),
                    );
                    state.append(reply);

                    current = next_node(GraphNode::Researcher, &state);
                    state.set_next_step(current.label());
                }

                GraphNode::ToolExecutor => {
                    let pending = state.pending_tool_calls().to_vec();
                    if pending.is_empty() {
                        warn!("tool executor entered with no pending tool calls");
                        current = GraphNode::Writer;
                        state.set_next_step(current.label());
                        continue;
                    }

                    let mut results = Vec::with_capacity(pending.len());
                    for call in &pending {
                        let outcome = self.tools.execute(call, context).await;
                        let text = match outcome {
                            Ok(text) => text,
                            // Fail closed: the error becomes the result text
                            // so the Researcher can react to it.
                            Err(err) => {
                                warn!(tool = call.name(), error = %err, "tool call failed");
                                format!("Error: {}", err)
                            }
                        };
                        results.push(Message::tool_result(call.id().clone(), text));
                    }
                    emit(
                        events,
                        TurnEvent::new(
                            GraphNode::ToolExecutor,
                            format!("executed {} tool call(s)", pending.len()),
                        ),
                    );
                    state.extend(results);

                    current = next_node(GraphNode::ToolExecutor, &state);
                    state.set_next_step(current.label());
                }

                GraphNode::Writer => {
                    let call_messages = vec![
                        Message::system(prompts::writer_directive()),
                        Message::user(prompts::render_transcript(state.messages())),
                    ];

                    // Plain-text mode: the Writer never requests tools.
                    let reply = self.model.invoke(&call_messages, None).await?;
                    let answer = reply.content().to_string();
                    emit(events, TurnEvent::new(GraphNode::Writer, "answer composed"));
                    state.append(Message::assistant(answer.clone()));

                    return Ok(TurnOutcome {
                        answer,
                        state,
                        research_iterations,
                        forced_writer,
                    });
                }

                GraphNode::Done => unreachable!("writer returns before reaching done"),
            }
        }
    }
}

fn emit(events: Option<&mpsc::UnboundedSender<TurnEvent>>, event: TurnEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockModelCaller;
    use crate::adapters::tools::BuiltinToolExecutor;
    use crate::adapters::retrieval::InMemoryRetriever;
    use crate::domain::foundation::{KnowledgeBaseId, SessionId};
    use crate::domain::tools::ToolCall;

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new(KnowledgeBaseId::default_kb(), SessionId::new(), 3)
    }

    fn executor(model: Arc<MockModelCaller>) -> Arc<BuiltinToolExecutor> {
        Arc::new(BuiltinToolExecutor::new(
            Arc::new(InMemoryRetriever::new()),
            model,
        ))
    }

    fn seeded_state(question: &str) -> TurnState {
        TurnState::from_messages(vec![Message::user(question)])
    }

    #[tokio::test]
    async fn direct_answer_turn_runs_researcher_then_writer() {
        let model = Arc::new(MockModelCaller::new());
        model.enqueue(Ok(Message::assistant("No tools needed.")));
        model.enqueue(Ok(Message::assistant("Hello! How can I help?")));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        let outcome = runner.run(seeded_state("hello"), &context(), None).await.unwrap();

        assert_eq!(outcome.answer, "Hello! How can I help?");
        assert_eq!(outcome.research_iterations, 1);
        assert!(!outcome.forced_writer);
    }

    #[tokio::test]
    async fn tool_turn_feeds_results_back_to_researcher() {
        let model = Arc::new(MockModelCaller::new());
        let call = ToolCall::generate(
            "calculate_expression",
            serde_json::json!({"expression": "2+2"}),
        );
        model.enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
        model.enqueue(Ok(Message::assistant("Research complete.")));
        model.enqueue(Ok(Message::assistant("2+2 is 4.")));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        let outcome = runner
            .run(seeded_state("what is 2+2?"), &context(), None)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "2+2 is 4.");
        assert_eq!(outcome.research_iterations, 2);

        // The tool result must be present in the final state.
        let tool_results: Vec<_> = outcome
            .state
            .messages()
            .iter()
            .filter(|m| m.tool_call_id().is_some())
            .collect();
        assert_eq!(tool_results.len(), 1);
        assert_eq!(tool_results[0].content(), "4");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_text_result() {
        let model = Arc::new(MockModelCaller::new());
        let call = ToolCall::generate("no_such_tool", serde_json::json!({}));
        model.enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
        model.enqueue(Ok(Message::assistant("Done researching.")));
        model.enqueue(Ok(Message::assistant("I could not run that tool.")));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        let outcome = runner
            .run(seeded_state("use a weird tool"), &context(), None)
            .await
            .unwrap();

        let tool_result = outcome
            .state
            .messages()
            .iter()
            .find(|m| m.tool_call_id().is_some())
            .unwrap();
        assert!(tool_result.content().starts_with("Error:"));
        assert!(tool_result.content().contains("no_such_tool"));
    }

    #[tokio::test]
    async fn each_requested_call_gets_one_correlated_result_in_order() {
        let model = Arc::new(MockModelCaller::new());
        let first = ToolCall::generate(
            "calculate_expression",
            serde_json::json!({"expression": "1+1"}),
        );
        let second = ToolCall::generate("get_current_time", serde_json::json!({}));
        model.enqueue(Ok(Message::assistant_with_tool_calls(
            "",
            vec![first.clone(), second.clone()],
        )));
        model.enqueue(Ok(Message::assistant("Done.")));
        model.enqueue(Ok(Message::assistant("Answer.")));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        let outcome = runner
            .run(seeded_state("two things"), &context(), None)
            .await
            .unwrap();

        let result_ids: Vec<_> = outcome
            .state
            .messages()
            .iter()
            .filter_map(|m| m.tool_call_id())
            .collect();
        assert_eq!(result_ids, vec![first.id(), second.id()]);
    }

    #[tokio::test]
    async fn iteration_cap_forces_writer() {
        let model = Arc::new(MockModelCaller::new());
        // Researcher keeps asking for tools on every invocation.
        for _ in 0..2 {
            let call = ToolCall::generate("get_current_time", serde_json::json!({}));
            model.enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
        }
        model.enqueue(Ok(Message::assistant("Best effort answer.")));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()))
            .with_max_research_iterations(2);
        let outcome = runner
            .run(seeded_state("loop forever"), &context(), None)
            .await
            .unwrap();

        assert!(outcome.forced_writer);
        assert_eq!(outcome.research_iterations, 2);
        assert_eq!(outcome.answer, "Best effort answer.");
    }

    #[tokio::test]
    async fn model_failure_aborts_turn() {
        let model = Arc::new(MockModelCaller::new());
        model.enqueue(Err(ModelError::AuthenticationFailed));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        let result = runner.run(seeded_state("hello"), &context(), None).await;

        assert!(matches!(
            result,
            Err(TurnError::Model(ModelError::AuthenticationFailed))
        ));
    }

    #[tokio::test]
    async fn events_trace_every_node() {
        let model = Arc::new(MockModelCaller::new());
        let call = ToolCall::generate(
            "calculate_expression",
            serde_json::json!({"expression": "1+1"}),
        );
        model.enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
        model.enqueue(Ok(Message::assistant("Done.")));
        model.enqueue(Ok(Message::assistant("1+1 is 2.")));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        runner
            .run(seeded_state("1+1?"), &context(), Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut nodes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            nodes.push(event.node);
        }
        assert_eq!(
            nodes,
            vec!["researcher", "tool_executor", "researcher", "writer"]
        );
    }

    #[tokio::test]
    async fn researcher_sees_directive_but_state_stays_clean() {
        let model = Arc::new(MockModelCaller::new());
        model.enqueue(Ok(Message::assistant("No tools.")));
        model.enqueue(Ok(Message::assistant("Answer.")));

        let runner = TurnRunner::new(model.clone(), executor(model.clone()));
        let outcome = runner.run(seeded_state("hi"), &context(), None).await.unwrap();

        // First captured call starts with the system directive.
        let captured = model.captured_calls();
        assert_eq!(
            captured[0].messages[0].origin(),
            crate::domain::agent::MessageOrigin::System
        );

        // But no system message ever enters the turn state.
        assert!(outcome
            .state
            .messages()
            .iter()
            .all(|m| m.origin() != crate::domain::agent::MessageOrigin::System));
    }
}
