//! Built-in tool suite.
//!
//! # Design
//!
//! Three tool families share one executor:
//! - knowledge tools (`ask_knowledge_base`, `list_knowledge_base_files`,
//!   `search_by_filename`) backed by the retriever and the store,
//! - model-backed tools (`general_qa`, `summarize_text`, `translate_text`,
//!   `analyze_code`) that make one plain-text model call each,
//! - local tools (`get_current_time`, `calculate_expression`) that run
//!   without any I/O.
//!
//! Every tool returns plain text; the Researcher reads the text, not a
//! structured payload.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::agent::Message;
use crate::domain::foundation::Timestamp;
use crate::domain::tools::{ToolCall, ToolDefinition, ToolRegistry};
use crate::ports::{
    ConversationStore, KnowledgeRetriever, ModelCaller, ToolExecutionContext,
    ToolExecutionError, ToolExecutor,
};

use super::calculator;

const NO_RELEVANT_CONTENT: &str = "No relevant content found in the knowledge base.";
const NO_FILES: &str = "The knowledge base has no ingested files.";

/// The standard tool suite offered to the Researcher.
pub struct BuiltinToolExecutor {
    retriever: Arc<dyn KnowledgeRetriever>,
    model: Arc<dyn ModelCaller>,
    store: Option<Arc<dyn ConversationStore>>,
    registry: ToolRegistry,
}

impl BuiltinToolExecutor {
    /// Creates the suite without file-listing support.
    pub fn new(retriever: Arc<dyn KnowledgeRetriever>, model: Arc<dyn ModelCaller>) -> Self {
        Self {
            retriever,
            model,
            store: None,
            registry: build_registry(),
        }
    }

    /// Attaches the store that backs the file-listing tools.
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn required_string<'a>(
        call: &'a ToolCall,
        key: &str,
    ) -> Result<&'a str, ToolExecutionError> {
        call.string_argument(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ToolExecutionError::invalid_arguments(
                    call.name(),
                    format!("missing required string argument '{}'", key),
                )
            })
    }

    async fn ask_knowledge_base(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolExecutionError> {
        let query = Self::required_string(call, "query")?;

        let passages = match self
            .retriever
            .query(query, context.knowledge_base(), context.top_k())
            .await
        {
            Ok(passages) => passages,
            // Retrieval failure reads like an empty result so the
            // Researcher can fall back to other tools.
            Err(err) => {
                debug!(error = %err, "retrieval failed");
                return Ok(NO_RELEVANT_CONTENT.to_string());
            }
        };

        if passages.is_empty() {
            return Ok(NO_RELEVANT_CONTENT.to_string());
        }

        let mut out = String::new();
        for passage in &passages {
            out.push_str(&format!("[{}] {}\n", passage.source, passage.text));
        }
        Ok(out)
    }

    async fn list_files(
        &self,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolExecutionError> {
        let Some(store) = &self.store else {
            return Ok(NO_FILES.to_string());
        };
        let files = store
            .files_for_knowledge_base(context.knowledge_base())
            .await
            .map_err(|e| ToolExecutionError::failed("list_knowledge_base_files", e.to_string()))?;

        if files.is_empty() {
            return Ok(NO_FILES.to_string());
        }

        let mut out = format!(
            "Files in knowledge base '{}' ({} total):\n",
            context.knowledge_base(),
            files.len()
        );
        for file in &files {
            out.push_str(&format!(
                "- {} ({}, {} chunks, ingested {})\n",
                file.file_name, file.file_type, file.chunk_count, file.ingested_at
            ));
        }
        Ok(out)
    }

    async fn search_by_filename(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolExecutionError> {
        let pattern = Self::required_string(call, "pattern")?;
        let Some(store) = &self.store else {
            return Ok(NO_FILES.to_string());
        };
        let files = store
            .files_for_knowledge_base(context.knowledge_base())
            .await
            .map_err(|e| ToolExecutionError::failed("search_by_filename", e.to_string()))?;

        let needle = pattern.to_lowercase();
        let matches: Vec<_> = files
            .iter()
            .filter(|f| f.file_name.to_lowercase().contains(&needle))
            .collect();

        if matches.is_empty() {
            return Ok(format!("No files matching '{}'.", pattern));
        }

        let mut out = format!("Files matching '{}':\n", pattern);
        for file in matches {
            out.push_str(&format!(
                "- {} ({}, {} chunks)\n",
                file.file_name, file.file_type, file.chunk_count
            ));
        }
        Ok(out)
    }

    async fn model_backed(
        &self,
        call: &ToolCall,
        directive: &str,
        input: String,
    ) -> Result<String, ToolExecutionError> {
        let messages = vec![Message::system(directive), Message::user(input)];
        let reply = self
            .model
            .invoke(&messages, None)
            .await
            .map_err(|e| ToolExecutionError::failed(call.name(), e.to_string()))?;
        Ok(reply.content().to_string())
    }

    async fn general_qa(&self, call: &ToolCall) -> Result<String, ToolExecutionError> {
        let question = Self::required_string(call, "question")?;
        self.model_backed(
            call,
            "You are a helpful assistant. Answer the question directly and concisely.",
            question.to_string(),
        )
        .await
    }

    async fn summarize_text(&self, call: &ToolCall) -> Result<String, ToolExecutionError> {
        let text = Self::required_string(call, "text")?;
        self.model_backed(
            call,
            "Summarize the following text in a few sentences, keeping the key facts.",
            text.to_string(),
        )
        .await
    }

    async fn translate_text(&self, call: &ToolCall) -> Result<String, ToolExecutionError> {
        let text = Self::required_string(call, "text")?;
        let target = call.string_argument("target_language").unwrap_or("English");
        self.model_backed(
            call,
            &format!(
                "Translate the following text into {}. Reply with the translation only.",
                target
            ),
            text.to_string(),
        )
        .await
    }

    async fn analyze_code(&self, call: &ToolCall) -> Result<String, ToolExecutionError> {
        let code = Self::required_string(call, "code")?;
        self.model_backed(
            call,
            "Explain what the following code does and point out any bugs or pitfalls.",
            code.to_string(),
        )
        .await
    }

    fn get_current_time(&self) -> String {
        Timestamp::now().to_string()
    }

    fn calculate_expression(&self, call: &ToolCall) -> Result<String, ToolExecutionError> {
        let expression = Self::required_string(call, "expression")?;
        calculator::evaluate(expression)
            .map_err(|e| ToolExecutionError::failed(call.name(), e.to_string()))
    }
}

#[async_trait]
impl ToolExecutor for BuiltinToolExecutor {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.registry.has_tool(name)
    }

    async fn execute(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolExecutionError> {
        debug!(tool = call.name(), "executing tool");
        match call.name() {
            "ask_knowledge_base" => self.ask_knowledge_base(call, context).await,
            "list_knowledge_base_files" => self.list_files(context).await,
            "search_by_filename" => self.search_by_filename(call, context).await,
            "general_qa" => self.general_qa(call).await,
            "summarize_text" => self.summarize_text(call).await,
            "translate_text" => self.translate_text(call).await,
            "analyze_code" => self.analyze_code(call).await,
            "get_current_time" => Ok(self.get_current_time()),
            "calculate_expression" => self.calculate_expression(call),
            other => Err(ToolExecutionError::ToolNotFound(other.to_string())),
        }
    }
}

fn build_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ToolDefinition::with_string_param(
        "ask_knowledge_base",
        "Semantic search over the knowledge base content. Use for questions \
         about what the ingested documents say.",
        "query",
        "A focused natural-language question",
    ));
    registry.register(ToolDefinition::nullary(
        "list_knowledge_base_files",
        "List every file ingested into the current knowledge base. Use when \
         the user asks which files or documents exist.",
    ));
    registry.register(ToolDefinition::with_string_param(
        "search_by_filename",
        "Find ingested files whose name contains a pattern. Use when the \
         user mentions a specific filename or extension.",
        "pattern",
        "Case-insensitive substring to match against file names",
    ));
    registry.register(ToolDefinition::with_string_param(
        "general_qa",
        "Answer a general question unrelated to the knowledge base.",
        "question",
        "The question to answer",
    ));
    registry.register(ToolDefinition::with_string_param(
        "summarize_text",
        "Summarize a block of text.",
        "text",
        "The text to summarize",
    ));
    registry.register(ToolDefinition::new(
        "translate_text",
        "Translate text into a target language.",
        serde_json::json!({
            "type": "object",
            "required": ["text"],
            "properties": {
                "text": { "type": "string", "description": "The text to translate" },
                "target_language": {
                    "type": "string",
                    "description": "Target language, defaults to English"
                }
            }
        }),
    ));
    registry.register(ToolDefinition::with_string_param(
        "analyze_code",
        "Explain a code snippet and point out problems.",
        "code",
        "The code to analyze",
    ));
    registry.register(ToolDefinition::nullary(
        "get_current_time",
        "Get the current date and time in UTC.",
    ));
    registry.register(ToolDefinition::with_string_param(
        "calculate_expression",
        "Evaluate an arithmetic expression with + - * / and parentheses.",
        "expression",
        "An infix arithmetic expression, e.g. (2 + 3) * 4",
    ));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockModelCaller;
    use crate::adapters::retrieval::InMemoryRetriever;
    use crate::domain::foundation::{KnowledgeBaseId, SessionId};

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new(KnowledgeBaseId::default_kb(), SessionId::new(), 3)
    }

    fn suite() -> (Arc<MockModelCaller>, Arc<InMemoryRetriever>, BuiltinToolExecutor) {
        let model = Arc::new(MockModelCaller::new());
        let retriever = Arc::new(InMemoryRetriever::new());
        let executor = BuiltinToolExecutor::new(retriever.clone(), model.clone());
        (model, retriever, executor)
    }

    #[test]
    fn suite_offers_nine_tools() {
        let (_, _, executor) = suite();
        assert_eq!(executor.definitions().len(), 9);
        assert!(executor.has_tool("ask_knowledge_base"));
        assert!(executor.has_tool("calculate_expression"));
        assert!(!executor.has_tool("no_such_tool"));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate("no_such_tool", serde_json::json!({}));
        let result = executor.execute(&call, &context()).await;
        assert!(matches!(result, Err(ToolExecutionError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn ask_knowledge_base_formats_passages_with_source() {
        let (_, retriever, executor) = suite();
        retriever.add_passage(
            &KnowledgeBaseId::default_kb(),
            "Vacation days accrue monthly.",
            "handbook.pdf",
        );

        let call = ToolCall::generate(
            "ask_knowledge_base",
            serde_json::json!({"query": "vacation days"}),
        );
        let text = executor.execute(&call, &context()).await.unwrap();
        assert!(text.contains("[handbook.pdf]"));
        assert!(text.contains("Vacation days accrue monthly."));
    }

    #[tokio::test]
    async fn ask_knowledge_base_empty_result_reads_as_no_content() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate(
            "ask_knowledge_base",
            serde_json::json!({"query": "anything"}),
        );
        let text = executor.execute(&call, &context()).await.unwrap();
        assert_eq!(text, NO_RELEVANT_CONTENT);
    }

    #[tokio::test]
    async fn ask_knowledge_base_requires_query() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate("ask_knowledge_base", serde_json::json!({}));
        let result = executor.execute(&call, &context()).await;
        assert!(matches!(
            result,
            Err(ToolExecutionError::InvalidArguments { .. })
        ));
    }

    #[tokio::test]
    async fn list_files_without_store_reports_no_files() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate("list_knowledge_base_files", serde_json::json!({}));
        let text = executor.execute(&call, &context()).await.unwrap();
        assert_eq!(text, NO_FILES);
    }

    #[tokio::test]
    async fn calculator_evaluates_expression() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate(
            "calculate_expression",
            serde_json::json!({"expression": "(2 + 3) * 4"}),
        );
        let text = executor.execute(&call, &context()).await.unwrap();
        assert_eq!(text, "20");
    }

    #[tokio::test]
    async fn calculator_reports_division_by_zero() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate(
            "calculate_expression",
            serde_json::json!({"expression": "1/0"}),
        );
        let result = executor.execute(&call, &context()).await;
        assert!(matches!(result, Err(ToolExecutionError::Failed { .. })));
    }

    #[tokio::test]
    async fn get_current_time_returns_utc_timestamp() {
        let (_, _, executor) = suite();
        let call = ToolCall::generate("get_current_time", serde_json::json!({}));
        let text = executor.execute(&call, &context()).await.unwrap();
        assert!(text.ends_with("UTC"));
    }

    #[tokio::test]
    async fn general_qa_delegates_to_model() {
        let (model, _, executor) = suite();
        model.enqueue(Ok(Message::assistant("Paris.")));

        let call = ToolCall::generate(
            "general_qa",
            serde_json::json!({"question": "capital of France?"}),
        );
        let text = executor.execute(&call, &context()).await.unwrap();
        assert_eq!(text, "Paris.");
        assert_eq!(model.call_count(), 1);
        // The nested model call runs in plain-text mode.
        assert!(model.captured_calls()[0].tools.is_none());
    }

    #[tokio::test]
    async fn model_backed_tool_failure_surfaces_as_tool_failure() {
        let (model, _, executor) = suite();
        model.enqueue(Err(crate::ports::ModelError::RateLimited));

        let call = ToolCall::generate(
            "summarize_text",
            serde_json::json!({"text": "long document"}),
        );
        let result = executor.execute(&call, &context()).await;
        assert!(matches!(result, Err(ToolExecutionError::Failed { .. })));
    }

    #[tokio::test]
    async fn translate_defaults_to_english() {
        let (model, _, executor) = suite();
        model.enqueue(Ok(Message::assistant("Hello")));

        let call = ToolCall::generate("translate_text", serde_json::json!({"text": "Bonjour"}));
        executor.execute(&call, &context()).await.unwrap();

        let captured = model.captured_calls();
        assert!(captured[0].messages[0].content().contains("English"));
    }
}
