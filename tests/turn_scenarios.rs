//! End-to-end turn scenarios through the chat service, with a scripted
//! model, the in-memory retriever, and a real SQLite store.

use std::sync::Arc;

use proptest::prelude::*;

use kb_scribe::adapters::ai::MockModelCaller;
use kb_scribe::adapters::retrieval::InMemoryRetriever;
use kb_scribe::adapters::sqlite::SqliteStore;
use kb_scribe::adapters::tools::BuiltinToolExecutor;
use kb_scribe::application::{ChatError, ChatService, KnowledgeBaseService, TurnRunner};
use kb_scribe::domain::agent::{next_node, GraphNode, Message, MessageOrigin, TurnState};
use kb_scribe::domain::foundation::KnowledgeBaseId;
use kb_scribe::domain::tools::ToolCall;
use kb_scribe::ports::{ConversationStore, ModelError, SessionRecord};

struct Harness {
    model: Arc<MockModelCaller>,
    retriever: Arc<InMemoryRetriever>,
    store: Arc<SqliteStore>,
    chat: ChatService,
    session: SessionRecord,
}

async fn harness() -> Harness {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = Arc::new(SqliteStore::from_pool(pool).await.unwrap());

    let kb_service = KnowledgeBaseService::new(store.clone());
    kb_service.ensure_default().await.unwrap();
    let session = kb_service
        .create_session(&KnowledgeBaseId::default_kb(), Some("test"))
        .await
        .unwrap();

    let model = Arc::new(MockModelCaller::new());
    let retriever = Arc::new(InMemoryRetriever::new());
    let tools = Arc::new(
        BuiltinToolExecutor::new(retriever.clone(), model.clone()).with_store(store.clone()),
    );
    let runner = TurnRunner::new(model.clone(), tools);
    let chat = ChatService::new(store.clone(), runner, 3);

    Harness {
        model,
        retriever,
        store,
        chat,
        session,
    }
}

#[tokio::test]
async fn file_listing_turn_reports_ingested_files_with_types() {
    let h = harness().await;
    let kb = KnowledgeBaseId::default_kb();
    h.store
        .record_ingested_file(&kb, "handbook.pdf", "pdf", 12)
        .await
        .unwrap();
    h.store
        .record_ingested_file(&kb, "roadmap.md", "markdown", 4)
        .await
        .unwrap();

    let call = ToolCall::generate("list_knowledge_base_files", serde_json::json!({}));
    h.model
        .enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
    h.model.enqueue(Ok(Message::assistant("Research complete.")));
    h.model.enqueue(Ok(Message::assistant(
        "The knowledge base holds handbook.pdf and roadmap.md.",
    )));

    let turn = h
        .chat
        .send_message(&h.session.id, "which files do we have?", None)
        .await
        .unwrap();

    assert!(turn.answer.contains("handbook.pdf"));
    assert_eq!(turn.research_iterations, 2);

    // The Writer saw the actual file listing, types included, in its
    // transcript.
    let captured = h.model.captured_calls();
    let writer_input = captured.last().unwrap().messages[1].content().to_string();
    assert!(writer_input.contains("handbook.pdf (pdf"));
    assert!(writer_input.contains("roadmap.md (markdown"));
}

#[tokio::test]
async fn empty_retrieval_reaches_writer_ungarnished() {
    let h = harness().await;
    // Retriever deliberately left empty.

    let call = ToolCall::generate(
        "ask_knowledge_base",
        serde_json::json!({"query": "unrelated topic xyz"}),
    );
    h.model
        .enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
    h.model.enqueue(Ok(Message::assistant("Research complete.")));
    h.model.enqueue(Ok(Message::assistant(
        "The knowledge base has no information on that topic.",
    )));

    let turn = h
        .chat
        .send_message(&h.session.id, "tell me about unrelated topic xyz", None)
        .await
        .unwrap();

    assert!(turn.answer.contains("no information"));

    // The Writer's grounding input carries the explicit no-content marker
    // and no passage text it could mistake for a document.
    let captured = h.model.captured_calls();
    let writer_input = captured.last().unwrap().messages[1].content().to_string();
    assert!(writer_input.contains("[tool]: No relevant content found in the knowledge base."));
    // Every bracketed prefix is an origin label; no source citation like
    // "[handbook.pdf]" sneaks in when retrieval found nothing.
    for line in writer_input.lines() {
        assert!(
            line.starts_with("[user]:")
                || line.starts_with("[assistant]:")
                || line.starts_with("[tool]:"),
            "unexpected transcript line: {line}"
        );
    }
}

#[tokio::test]
async fn arithmetic_turn_uses_the_calculator() {
    let h = harness().await;

    let call = ToolCall::generate(
        "calculate_expression",
        serde_json::json!({"expression": "2+2"}),
    );
    h.model
        .enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
    h.model.enqueue(Ok(Message::assistant("Research complete.")));
    h.model.enqueue(Ok(Message::assistant("2 + 2 equals 4.")));

    let turn = h
        .chat
        .send_message(&h.session.id, "what is 2+2?", None)
        .await
        .unwrap();

    assert!(turn.answer.contains('4'));

    // The exact tool output reached the Writer.
    let captured = h.model.captured_calls();
    let writer_input = captured.last().unwrap().messages[1].content().to_string();
    assert!(writer_input.contains("[tool]: 4"));
}

#[tokio::test]
async fn retrieval_turn_cites_the_source_document() {
    let h = harness().await;
    h.retriever.add_passage(
        &KnowledgeBaseId::default_kb(),
        "Employees accrue fifteen vacation days per year.",
        "handbook.pdf",
    );

    let call = ToolCall::generate(
        "ask_knowledge_base",
        serde_json::json!({"query": "vacation days"}),
    );
    h.model
        .enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
    h.model.enqueue(Ok(Message::assistant("Research complete.")));
    h.model.enqueue(Ok(Message::assistant(
        "Fifteen vacation days per year, per handbook.pdf.",
    )));

    let turn = h
        .chat
        .send_message(&h.session.id, "how many vacation days?", None)
        .await
        .unwrap();

    assert!(turn.answer.contains("Fifteen"));
    let captured = h.model.captured_calls();
    let writer_input = captured.last().unwrap().messages[1].content().to_string();
    assert!(writer_input.contains("[handbook.pdf]"));
}

#[tokio::test]
async fn model_failure_persists_nothing() {
    let h = harness().await;
    h.model.enqueue(Err(ModelError::Unavailable("503".into())));

    let result = h.chat.send_message(&h.session.id, "hello", None).await;
    assert!(matches!(result, Err(ChatError::Turn(_))));

    let history = h.store.read_history(&h.session.id, 50).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn successful_turn_persists_only_user_and_assistant() {
    let h = harness().await;

    let call = ToolCall::generate("get_current_time", serde_json::json!({}));
    h.model
        .enqueue(Ok(Message::assistant_with_tool_calls("", vec![call])));
    h.model.enqueue(Ok(Message::assistant("Done.")));
    h.model.enqueue(Ok(Message::assistant("It is late.")));

    h.chat
        .send_message(&h.session.id, "what time is it?", None)
        .await
        .unwrap();

    let history = h.store.read_history(&h.session.id, 50).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].origin, MessageOrigin::User);
    assert_eq!(history[0].content, "what time is it?");
    assert_eq!(history[1].origin, MessageOrigin::Assistant);
    assert_eq!(history[1].content, "It is late.");
}

#[tokio::test]
async fn second_turn_sees_first_turn_history() {
    let h = harness().await;

    h.model.enqueue(Ok(Message::assistant("No tools.")));
    h.model.enqueue(Ok(Message::assistant("I am a librarian.")));
    h.chat
        .send_message(&h.session.id, "who are you?", None)
        .await
        .unwrap();

    h.model.enqueue(Ok(Message::assistant("No tools.")));
    h.model.enqueue(Ok(Message::assistant("As I said, a librarian.")));
    h.chat
        .send_message(&h.session.id, "repeat that", None)
        .await
        .unwrap();

    // The second Researcher call saw the persisted first exchange after the
    // system directive.
    let captured = h.model.captured_calls();
    let second_researcher = &captured[2].messages;
    assert_eq!(second_researcher[0].origin(), MessageOrigin::System);
    assert_eq!(second_researcher[1].content(), "who are you?");
    assert_eq!(second_researcher[2].content(), "I am a librarian.");
    assert_eq!(second_researcher[3].content(), "repeat that");
}

#[tokio::test]
async fn empty_message_is_rejected_without_model_calls() {
    let h = harness().await;
    let result = h.chat.send_message(&h.session.id, "   ", None).await;
    assert!(matches!(result, Err(ChatError::EmptyMessage)));
    assert_eq!(h.model.call_count(), 0);
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let h = harness().await;
    let ghost = kb_scribe::domain::foundation::SessionId::new();
    let result = h.chat.send_message(&ghost, "hello", None).await;
    assert!(matches!(result, Err(ChatError::SessionNotFound(_))));
}

#[tokio::test]
async fn default_knowledge_base_cannot_be_deleted() {
    let h = harness().await;
    let kb_service = KnowledgeBaseService::new(h.store.clone());
    let result = kb_service.delete(&KnowledgeBaseId::default_kb()).await;
    assert!(matches!(
        result,
        Err(kb_scribe::application::KnowledgeBaseError::DefaultProtected)
    ));
}

fn arbitrary_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        ".{0,40}".prop_map(Message::user),
        ".{0,40}".prop_map(Message::assistant),
        (1usize..4).prop_map(|n| {
            let calls = (0..n)
                .map(|_| ToolCall::generate("get_current_time", serde_json::json!({})))
                .collect();
            Message::assistant_with_tool_calls("", calls)
        }),
    ]
}

proptest! {
    #[test]
    fn researcher_routing_depends_only_on_last_message(
        messages in prop::collection::vec(arbitrary_message(), 1..8)
    ) {
        let last_has_calls = messages.last().unwrap().has_tool_calls();
        let state = TurnState::from_messages(messages);

        let next = next_node(GraphNode::Researcher, &state);
        if last_has_calls {
            prop_assert_eq!(next, GraphNode::ToolExecutor);
        } else {
            prop_assert_eq!(next, GraphNode::Writer);
        }
    }

    #[test]
    fn executor_always_routes_back_to_researcher(
        messages in prop::collection::vec(arbitrary_message(), 0..8)
    ) {
        let state = TurnState::from_messages(messages);
        prop_assert_eq!(next_node(GraphNode::ToolExecutor, &state), GraphNode::Researcher);
    }

    #[test]
    fn appending_never_disturbs_existing_messages(
        existing in prop::collection::vec(arbitrary_message(), 0..8),
        added in prop::collection::vec(arbitrary_message(), 0..8)
    ) {
        let mut state = TurnState::from_messages(existing.clone());
        state.extend(added.clone());

        prop_assert_eq!(state.len(), existing.len() + added.len());
        prop_assert_eq!(&state.messages()[..existing.len()], &existing[..]);
    }
}
