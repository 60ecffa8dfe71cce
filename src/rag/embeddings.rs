//! Text embedding for the retrieval store.
//!
//! The store owns similarity; it asks an [`Embedder`] to turn chunk and query
//! text into vectors.
//!
//! - [`FastEmbedder`] - local ONNX sentence-embedding model via `fastembed`
//!   (`all-MiniLM-L6-v2` by default). Requires the `local-embeddings` feature.
//! - [`OllamaEmbedder`] - dense embeddings from an Ollama embedding model such
//!   as `nomic-embed-text`.
//! - [`HashingEmbedder`] - deterministic bag-of-words hashing with no model,
//!   used by tests. It only matches shared words.

use crate::llm::ollama::connect;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingProvider, EmbeddingsConfig};
use async_trait::async_trait;
use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Embed a single piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Build the embedder selected in configuration.
///
/// Loading a local model may download it first, so this runs on the blocking pool.
pub async fn create_embedder(
    config: &EmbeddingsConfig,
    ollama_url: &str,
) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::FastEmbed => create_fastembed(config).await,
        EmbeddingProvider::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            ollama_url,
            config.model_name().to_string(),
        )?)),
    }
}

#[cfg(feature = "local-embeddings")]
async fn create_fastembed(config: &EmbeddingsConfig) -> Result<Arc<dyn Embedder>> {
    let model = config.model_name().to_string();
    let cache_dir = config.cache_dir.clone();

    let embedder = tokio::task::spawn_blocking(move || FastEmbedder::new(&model, cache_dir))
        .await
        .map_err(|e| AppError::Internal(format!("Embedding model loader failed: {}", e)))??;
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "local-embeddings"))]
async fn create_fastembed(_config: &EmbeddingsConfig) -> Result<Arc<dyn Embedder>> {
    Err(AppError::Configuration(
        "embeddings.provider = \"fastembed\" needs the local-embeddings feature; \
         rebuild with it or use \"ollama\""
            .into(),
    ))
}

// ============================================================================
// Local Embedder (fastembed)
// ============================================================================

#[cfg(feature = "local-embeddings")]
pub use local::{FastEmbedder, parse_model};

#[cfg(feature = "local-embeddings")]
mod local {
    use super::Embedder;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tracing::info;

    /// Map a model name from configuration to a fastembed model.
    ///
    /// Names are matched case-insensitively, with or without the
    /// `sentence-transformers/` or `BAAI/` prefix.
    pub fn parse_model(name: &str) -> Result<EmbeddingModel> {
        let lower = name.trim().to_ascii_lowercase();
        let short = lower
            .strip_prefix("sentence-transformers/")
            .or_else(|| lower.strip_prefix("baai/"))
            .or_else(|| lower.strip_prefix("nomic-ai/"))
            .unwrap_or(&lower);

        match short {
            "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
            _ => Err(AppError::Configuration(format!(
                "Unknown local embedding model '{}'",
                name
            ))),
        }
    }

    /// Sentence-embedding model running in process.
    pub struct FastEmbedder {
        /// Inference needs exclusive access to the ONNX session
        model: Arc<Mutex<TextEmbedding>>,
        name: String,
    }

    impl FastEmbedder {
        /// Load `model_name`, downloading it into `cache_dir` on first use.
        ///
        /// Blocking; call from a blocking context.
        pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
            let mut options =
                InitOptions::new(parse_model(model_name)?).with_show_download_progress(true);
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }

            let model = TextEmbedding::try_new(options).map_err(|e| {
                AppError::Configuration(format!(
                    "Failed to load embedding model '{}': {}",
                    model_name, e
                ))
            })?;

            info!(model = model_name, "Loaded local embedding model");
            Ok(Self {
                model: Arc::new(Mutex::new(model)),
                name: model_name.to_string(),
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let model = self.model.clone();
            let input = vec![text.to_string()];

            let embeddings = tokio::task::spawn_blocking(move || model.lock().embed(input, None))
                .await
                .map_err(|e| AppError::Internal(format!("Embedding task failed: {}", e)))?
                .map_err(|e| AppError::Store(format!("Local embedding error: {}", e)))?;

            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| AppError::Store("Embedding model returned no vector".to_string()))
        }
    }
}

// ============================================================================
// Hashing Embedder
// ============================================================================

/// Feature-hashing embedder: every lowercase word is hashed into one of
/// `dimensions` buckets with a hash-derived sign, and the result is L2
/// normalized.
///
/// Deterministic and instant, which suits tests. Unrelated wording never
/// matches, so it is not offered as a configured provider.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

// ============================================================================
// Ollama Embedder
// ============================================================================

pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        Ok(Self {
            client: connect(base_url)?,
            model,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(
            self.model.clone(),
            EmbeddingsInput::Single(text.to_string()),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::Store(format!("Ollama embedding error: {}", e)))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Store("Ollama returned no embedding".to_string()))
    }
}
