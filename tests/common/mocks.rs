//! Mock implementations for testing.
//!
//! This module provides a mock LLM client and a failing retrieval store that
//! can be used across different test files without duplication.

use async_trait::async_trait;
use docrag::{
    AppState, DocragConfig,
    db::{InMemoryRetrievalStore, RetrievalStore},
    llm::LLMClient,
    rag::embeddings::HashingEmbedder,
    types::{AppError, Chunk, Result, RetrievalMatch},
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Mock LLM client for testing with configurable responses.
///
/// Every prompt it receives is recorded so tests can inspect what the query
/// pipeline sent.
///
/// # Examples
///
/// ```ignore
/// // Create a client that returns a simple response
/// let client = MockLLMClient::new("Hello, world!");
///
/// // Create a client that always fails
/// let client = MockLLMClient::failing();
/// ```
#[derive(Clone, Default)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            ..Default::default()
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::Generation("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Retrieval store whose every call fails with a store error.
pub struct FailingStore;

#[async_trait]
impl RetrievalStore for FailingStore {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    fn collection_name(&self) -> &str {
        "test"
    }

    async fn add(&self, _chunk: &Chunk) -> Result<()> {
        Err(AppError::Store("Mock store failure".to_string()))
    }

    async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<RetrievalMatch>> {
        Err(AppError::Store("Mock store failure".to_string()))
    }

    async fn clear(&self) -> Result<()> {
        Err(AppError::Store("Mock store failure".to_string()))
    }

    async fn count(&self) -> Result<usize> {
        Err(AppError::Store("Mock store failure".to_string()))
    }
}

/// Fresh in-memory store using the hashing embedder.
pub fn memory_store() -> Arc<InMemoryRetrievalStore> {
    Arc::new(InMemoryRetrievalStore::new(
        "test",
        Arc::new(HashingEmbedder::new(256)),
    ))
}

/// Application state over the given store and model with default configuration.
pub fn test_state(
    config: DocragConfig,
    store: Arc<dyn RetrievalStore>,
    llm: Arc<dyn LLMClient>,
) -> AppState {
    AppState {
        config: Arc::new(config),
        store,
        llm,
    }
}
