//! LLM Provider Clients
//!
//! The generation model sits behind the [`LLMClient`] trait so the query
//! pipeline can be exercised with mocks and so other providers can be added
//! without touching it.
//!
//! # Supported Providers
//!
//! - `ollama` - Local Ollama server, called through its `/api/generate` endpoint
//!
//! # Example
//!
//! ```ignore
//! use docrag::llm::Provider;
//!
//! let client = Provider::Ollama {
//!     base_url: "http://localhost:11434".into(),
//!     model: "tinyllama".into(),
//! }
//! .create_client()?;
//!
//! let answer = client.generate("What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Ollama client.
pub mod ollama;

pub use client::{LLMClient, Provider};
pub use ollama::OllamaClient;
