//! Retrieval stores.
//!
//! # Providers
//!
//! - `local` (default) - In-process index persisted to an append-only file
//! - `memory` - In-process index, lost on restart
//! - `chromadb` - ChromaDB server over REST
//!
//! The ChromaDB client is behind the `chromadb` Cargo feature, enabled by
//! default:
//! ```toml
//! docrag-server = { version = "*", default-features = false }
//! ```

#![allow(missing_docs)]

// Retrieval store abstraction layer
pub mod vectorstore;

// Provider implementations
pub mod local;

#[cfg(feature = "chromadb")]
pub mod chromadb;

// Re-exports
pub use local::LocalRetrievalStore;
pub use vectorstore::{InMemoryRetrievalStore, RetrievalStore, StoreBackend};

#[cfg(feature = "chromadb")]
pub use chromadb::ChromaDBStore;
