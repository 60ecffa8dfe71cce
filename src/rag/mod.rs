//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Sentence-aware text chunking with overlap
//! - [`rag::embeddings`](crate::rag::embeddings) - Text to vector for the retrieval store
//! - [`rag::ingest`](crate::rag::ingest) - Documents and raw text into the store
//! - [`rag::query`](crate::rag::query) - Retrieval, prompt assembly and generation
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - Documents are parsed, chunked and tagged with their source
//! 2. **Storage** - Chunks are embedded and written to the retrieval store
//! 3. **Retrieval** - The query is matched against stored chunks
//! 4. **Generation** - The LLM answers from the retrieved context
//!
//! # Example
//!
//! ```ignore
//! use docrag::rag::{chunker::TextChunker, ingest::IngestionPipeline, query::QueryPipeline};
//!
//! let ingest = IngestionPipeline::new(store.clone());
//! ingest.ingest_directory(Path::new("./Documents"), TextChunker::default()).await?;
//!
//! let query = QueryPipeline::new(store, llm);
//! let result = query.answer("What does the handbook say about leave?", 3).await?;
//! println!("{} (sources: {:?})", result.answer, result.sources);
//! ```

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod query;
