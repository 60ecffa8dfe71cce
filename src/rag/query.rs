//! Query pipeline: retrieve, augment, generate.

use crate::db::RetrievalStore;
use crate::llm::LLMClient;
use crate::types::{AppError, QueryResult, Result, RetrievalMatch};
use std::sync::Arc;
use tracing::{debug, info};

/// Answer returned when retrieval finds nothing. The model is not called.
pub const NO_MATCHES_ANSWER: &str = "No relevant documents found in the knowledge base.";

/// Answers questions from the chunks held in a [`RetrievalStore`].
#[derive(Clone)]
pub struct QueryPipeline {
    store: Arc<dyn RetrievalStore>,
    llm: Arc<dyn LLMClient>,
}

impl QueryPipeline {
    pub fn new(store: Arc<dyn RetrievalStore>, llm: Arc<dyn LLMClient>) -> Self {
        Self { store, llm }
    }

    /// Retrieve the `n_results` closest chunks and ask the model to answer from them.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] for an empty query or `n_results == 0`
    /// - [`AppError::Store`] if retrieval fails
    /// - [`AppError::Generation`] if the model fails or answers with nothing
    pub async fn answer(&self, query: &str, n_results: usize) -> Result<QueryResult> {
        let matches = self.retrieve(query, n_results).await?;

        if matches.is_empty() {
            info!("No matching chunks, skipping generation");
            return Ok(QueryResult {
                answer: NO_MATCHES_ANSWER.to_string(),
                sources: Vec::new(),
                chunks_used: 0,
            });
        }

        let prompt = build_prompt(&build_context(&matches), query);
        debug!(model = self.llm.model_name(), prompt_chars = prompt.chars().count(), "Calling model");

        let answer = self.llm.generate(&prompt).await?;
        if answer.trim().is_empty() {
            return Err(AppError::Generation(format!(
                "Model '{}' returned an empty response",
                self.llm.model_name()
            )));
        }

        let sources = unique_sources(&matches);
        info!(chunks_used = matches.len(), sources = sources.len(), "Answered query");

        Ok(QueryResult {
            answer,
            sources,
            chunks_used: matches.len(),
        })
    }

    /// Retrieval step alone, best matches first.
    pub async fn retrieve(&self, query: &str, n_results: usize) -> Result<Vec<RetrievalMatch>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query must not be empty".to_string()));
        }
        if n_results == 0 {
            return Err(AppError::InvalidInput(
                "n_results must be greater than 0".to_string(),
            ));
        }

        self.store.query(query, n_results).await
    }
}

/// Render matches as `[Source: name]` blocks separated by blank lines.
pub fn build_context(matches: &[RetrievalMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("[Source: {}]\n{}", m.source, m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the question using only the context below.\n\
         If the context does not contain the answer, say that you don't know.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {query}\n\
         \n\
         Answer clearly and concisely:"
    )
}

/// Source names in first-seen order, without repeats.
pub fn unique_sources(matches: &[RetrievalMatch]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for m in matches {
        if !sources.contains(&m.source) {
            sources.push(m.source.clone());
        }
    }
    sources
}
