//! Service entry point: wires configuration, storage, retrieval, the model
//! caller, and the HTTP surface together.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kb_scribe::adapters::ai::OpenAiModelCaller;
use kb_scribe::adapters::http::{router, AppState};
use kb_scribe::adapters::retrieval::InMemoryRetriever;
use kb_scribe::adapters::sqlite::SqliteStore;
use kb_scribe::adapters::tools::BuiltinToolExecutor;
use kb_scribe::application::{ChatService, KnowledgeBaseService, TurnRunner};
use kb_scribe::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; absence is not an error.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let store = Arc::new(SqliteStore::connect(config.database.url()).await?);
    let retriever = Arc::new(InMemoryRetriever::new());
    let model = Arc::new(OpenAiModelCaller::new(&config.ai)?);

    let tools = Arc::new(
        BuiltinToolExecutor::new(retriever, model.clone()).with_store(store.clone()),
    );

    let runner = TurnRunner::new(model, tools)
        .with_max_research_iterations(config.retrieval.max_research_iterations());
    let chat = Arc::new(
        ChatService::new(store.clone(), runner, config.retrieval.top_k())
            .with_history_limit(config.retrieval.history_limit()),
    );
    let knowledge_bases = Arc::new(KnowledgeBaseService::new(store.clone()));
    knowledge_bases.ensure_default().await?;

    let state = AppState {
        chat,
        knowledge_bases,
        store,
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
