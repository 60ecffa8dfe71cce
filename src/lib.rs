//! # docrag - Document Retrieval-Augmented Generation
//!
//! A small RAG server in Rust: documents are split into overlapping,
//! sentence-aware chunks, stored in a vector index, and questions are answered
//! by a local LLM from the most similar chunks.
//!
//! ## Overview
//!
//! docrag can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `docrag` binary
//! 2. **As a library** - Import the pipelines into your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use docrag::{
//!     DocragConfig,
//!     rag::{chunker::TextChunker, embeddings::create_embedder, ingest::IngestionPipeline},
//! };
//!
//! #[tokio::main]
//! async fn main() -> docrag::Result<()> {
//!     let config = DocragConfig::default();
//!     let embedder = create_embedder(&config.embeddings, &config.llm.base_url).await?;
//!     let store = config.store.provider.create_store(&config.store, embedder).await?;
//!
//!     let ids = IngestionPipeline::new(store)
//!         .ingest_text("Rust has no garbage collector. Ownership frees memory.", TextChunker::default())
//!         .await?;
//!     println!("stored {} chunks", ids.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `chromadb` | ChromaDB retrieval store over REST (default) |
//! | `local-embeddings` | In-process embedding models via fastembed (default) |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Command line parsing and terminal output
//! - [`db`] - Retrieval store abstraction and backends
//! - [`documents`] - Text extraction from TXT, PDF and DOCX
//! - [`llm`] - LLM client implementations
//! - [`rag`] - Chunking, embeddings, ingestion and query pipelines
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Retrieval stores (in-memory, ChromaDB).
pub mod db;
/// Document text extraction.
pub mod documents;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use db::{RetrievalStore, StoreBackend};
pub use llm::{LLMClient, Provider};
pub use rag::{chunker::TextChunker, ingest::IngestionPipeline, query::QueryPipeline};
pub use types::{AppError, Result};
pub use utils::toml_config::DocragConfig;

use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<DocragConfig>,
    /// Retrieval store, built once at startup
    pub store: Arc<dyn RetrievalStore>,
    /// Generation model client
    pub llm: Arc<dyn LLMClient>,
}

impl AppState {
    /// Ingestion pipeline writing to the shared store
    pub fn ingestion(&self) -> IngestionPipeline {
        IngestionPipeline::new(self.store.clone())
    }

    /// Query pipeline over the shared store and model
    pub fn query_pipeline(&self) -> QueryPipeline {
        QueryPipeline::new(self.store.clone(), self.llm.clone())
    }

    /// Build the store and LLM client described by `config`.
    pub async fn from_config(config: DocragConfig) -> Result<Self> {
        let embedder =
            rag::embeddings::create_embedder(&config.embeddings, &config.llm.base_url).await?;
        let store = config
            .store
            .provider
            .create_store(&config.store, embedder)
            .await?;
        let llm: Arc<dyn LLMClient> = Provider::Ollama {
            base_url: config.llm.base_url.clone(),
            model: config.llm.model.clone(),
        }
        .create_client()?
        .into();

        Ok(Self {
            config: Arc::new(config),
            store,
            llm,
        })
    }
}

/// Full HTTP application: routes, state and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::routes::create_router()
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
