//! In-memory keyword retriever.
//!
//! Scores passages by keyword overlap with the query. Suitable for tests
//! and small deployments; a vector-store retriever plugs in behind the same
//! port without touching the application layer.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::KnowledgeBaseId;
use crate::ports::{KnowledgeRetriever, RetrievalError, RetrievedPassage};

#[derive(Debug, Clone)]
struct StoredPassage {
    text: String,
    source: String,
}

/// Keyword-overlap retriever over passages held in memory, partitioned by
/// knowledge base.
#[derive(Default)]
pub struct InMemoryRetriever {
    passages: RwLock<HashMap<KnowledgeBaseId, Vec<StoredPassage>>>,
}

impl InMemoryRetriever {
    /// Creates an empty retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a passage to a knowledge base partition.
    pub fn add_passage(
        &self,
        knowledge_base: &KnowledgeBaseId,
        text: impl Into<String>,
        source: impl Into<String>,
    ) {
        self.passages
            .write()
            .unwrap()
            .entry(knowledge_base.clone())
            .or_default()
            .push(StoredPassage {
                text: text.into(),
                source: source.into(),
            });
    }

    /// Returns the number of passages held for a knowledge base.
    pub fn passage_count(&self, knowledge_base: &KnowledgeBaseId) -> usize {
        self.passages
            .read()
            .unwrap()
            .get(knowledge_base)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn overlap_score(query_tokens: &[String], passage: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let passage_tokens = tokenize(passage);
    let hits = query_tokens
        .iter()
        .filter(|t| passage_tokens.contains(t))
        .count();
    hits as f64 / query_tokens.len() as f64
}

#[async_trait]
impl KnowledgeRetriever for InMemoryRetriever {
    async fn query(
        &self,
        query: &str,
        knowledge_base: &KnowledgeBaseId,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let query_tokens = tokenize(query);
        let guard = self.passages.read().unwrap();

        // An unknown partition yields no passages rather than an error;
        // emptiness is a normal retrieval outcome.
        let Some(partition) = guard.get(knowledge_base) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<RetrievedPassage> = partition
            .iter()
            .map(|p| RetrievedPassage {
                text: p.text.clone(),
                source: p.source.clone(),
                score: overlap_score(&query_tokens, &p.text),
            })
            .filter(|p| p.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
