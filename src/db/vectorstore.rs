//! Retrieval Store Abstraction Layer
//!
//! The pipelines talk to the vector index only through [`RetrievalStore`]:
//! add a chunk, query by text, clear, count. How vectors are computed,
//! indexed and persisted is the backend's business.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 RetrievalStore Trait                 │
//! ├─────────────────────────────────────────────────────┤
//! │     add     │    query    │    clear    │    count   │
//! └─────────────────────────────────────────────────────┘
//!        ▲                 ▲                   ▲
//!        │                 │                   │
//!  ┌─────┴──────┐   ┌──────┴──────┐     ┌──────┴─────┐
//!  │   Local    │   │  InMemory   │     │  ChromaDB  │
//!  │ (default)  │   │             │     │ (REST API) │
//!  └────────────┘   └─────────────┘     └────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::db::vectorstore::{RetrievalStore, StoreBackend};
//!
//! let store = StoreBackend::Local.create_store(&config.store, embedder).await?;
//! store.add(&chunk).await?;
//! let matches = store.query("what is a chunk?", 3).await?;
//! ```

use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Chunk, RetrievalMatch, Result};
use crate::utils::toml_config::StoreConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// Store Backend Configuration
// ============================================================================

/// Available retrieval store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process index backed by an append-only file under `store.path`.
    #[default]
    Local,

    /// In-process store. Data is lost when the process exits.
    #[serde(alias = "inmemory")]
    Memory,

    /// ChromaDB server reached over its REST API.
    ///
    /// Requires the `chromadb` feature (enabled by default).
    ChromaDB,
}

impl StoreBackend {
    /// Create a store handle for this backend.
    ///
    /// # Arguments
    ///
    /// * `config` - Collection name, data path and server location.
    /// * `embedder` - Embedder used for both stored chunks and queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, its data cannot be
    /// read, or its feature is not enabled.
    pub async fn create_store(
        &self,
        config: &StoreConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Arc<dyn RetrievalStore>> {
        match self {
            StoreBackend::Local => {
                let store =
                    super::local::LocalRetrievalStore::open(&config.path, &config.collection, embedder)
                        .await?;
                Ok(Arc::new(store))
            }

            StoreBackend::Memory => Ok(Arc::new(InMemoryRetrievalStore::new(
                config.collection.as_str(),
                embedder,
            ))),

            #[cfg(feature = "chromadb")]
            StoreBackend::ChromaDB => {
                let store = super::chromadb::ChromaDBStore::new(config, embedder).await?;
                Ok(Arc::new(store))
            }

            #[allow(unreachable_patterns)]
            _ => Err(AppError::Configuration(
                "Retrieval store backend not enabled. Check feature flags.".into(),
            )),
        }
    }
}

// ============================================================================
// Retrieval Store Trait
// ============================================================================

/// Vector similarity index keyed by chunk id.
///
/// Implementations must be safe for concurrent use: the pipelines never
/// serialize access themselves.
#[async_trait]
pub trait RetrievalStore: Send + Sync {
    /// Get the name of this store provider.
    fn provider_name(&self) -> &'static str;

    /// Name of the collection this handle writes to.
    fn collection_name(&self) -> &str;

    /// Store one chunk with its metadata and embedding.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the id already exists or the backend
    /// rejects the write.
    async fn add(&self, chunk: &Chunk) -> Result<()>;

    /// Find up to `top_k` chunks most similar to `text`, best first.
    ///
    /// Returns fewer than `top_k` matches when the store holds fewer chunks.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievalMatch>>;

    /// Drop every stored chunk.
    async fn clear(&self) -> Result<()>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// In-Memory Retrieval Store
// ============================================================================

/// Chunks and their embeddings, in insertion order.
///
/// Shared by the in-memory and local backends.
#[derive(Default)]
pub(crate) struct InMemoryCollection {
    ids: HashSet<String>,
    chunks: Vec<(Chunk, Vec<f32>)>,
}

impl InMemoryCollection {
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Append a chunk, rejecting an id that is already stored.
    pub(crate) fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if !self.ids.insert(chunk.id.clone()) {
            return Err(duplicate_id(&chunk.id));
        }
        self.chunks.push((chunk, embedding));
        Ok(())
    }

    /// Up to `top_k` chunks closest to `query`. Distance is `1 - cosine similarity`.
    pub(crate) fn search(&self, query: &[f32], top_k: usize) -> Vec<RetrievalMatch> {
        let mut scored: Vec<(f32, &Chunk)> = self
            .chunks
            .iter()
            .map(|(chunk, embedding)| (1.0 - cosine_similarity(query, embedding), chunk))
            .collect();

        // Stable sort keeps insertion order for ties
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(distance, chunk)| RetrievalMatch {
                text: chunk.text.clone(),
                source: chunk.metadata.source.clone(),
                chunk_index: chunk.metadata.chunk_index,
                distance: Some(distance),
            })
            .collect()
    }
}

pub(crate) fn duplicate_id(id: &str) -> AppError {
    AppError::Store(format!("Chunk id '{}' already exists", id))
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// In-memory retrieval store.
///
/// Data is not persisted and will be lost when the process exits.
/// Equal distances keep insertion order.
pub struct InMemoryRetrievalStore {
    collection: String,
    embedder: Arc<dyn Embedder>,
    entries: RwLock<InMemoryCollection>,
}

impl InMemoryRetrievalStore {
    /// Create a new, empty in-memory store.
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            collection: collection.into(),
            embedder,
            entries: RwLock::new(InMemoryCollection::default()),
        }
    }
}

#[async_trait]
impl RetrievalStore for InMemoryRetrievalStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn add(&self, chunk: &Chunk) -> Result<()> {
        if self.entries.read().contains(&chunk.id) {
            return Err(duplicate_id(&chunk.id));
        }

        let embedding = self.embedder.embed(&chunk.text).await?;
        self.entries.write().insert(chunk.clone(), embedding)
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievalMatch>> {
        let query_embedding = self.embedder.embed(text).await?;
        Ok(self.entries.read().search(&query_embedding, top_k))
    }

    async fn clear(&self) -> Result<()> {
        *self.entries.write() = InMemoryCollection::default();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
}

// ============================================================================
// Tests
// ============================================================================
