//! File-backed retrieval store.
//!
//! The index lives in memory like [`InMemoryRetrievalStore`](super::InMemoryRetrievalStore),
//! and every added chunk is also appended, with its embedding, as one JSON line
//! to `{path}/{collection}.jsonl`. The file is replayed when the store is
//! opened, so chunks written by one process are visible to the next. `clear`
//! truncates the file.
//!
//! Embeddings are stored as computed. Switching the embedding model makes the
//! stored vectors meaningless; clear the collection and ingest again.

use super::vectorstore::{InMemoryCollection, RetrievalStore, duplicate_id};
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Chunk, RetrievalMatch, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One line of the collection file.
#[derive(Serialize)]
struct StoredChunkRef<'a> {
    chunk: &'a Chunk,
    embedding: &'a [f32],
}

#[derive(Deserialize)]
struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Retrieval store persisted to a local append-only file.
pub struct LocalRetrievalStore {
    collection: String,
    file_path: PathBuf,
    embedder: Arc<dyn Embedder>,
    entries: RwLock<InMemoryCollection>,
    /// Serializes writers so the file and the index agree
    log: Mutex<File>,
}

impl LocalRetrievalStore {
    /// Open (or create) `collection` under the directory `path`.
    ///
    /// Lines that cannot be decoded, such as a record cut short by a crash,
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the directory or file cannot be created
    /// or read.
    pub async fn open(
        path: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let dir = path.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Store(format!("Failed to create data directory {}: {}", dir.display(), e))
        })?;

        let file_path = dir.join(format!("{}.jsonl", collection));
        let mut entries = InMemoryCollection::default();
        let mut needs_newline = false;

        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => {
                needs_newline = !content.is_empty() && !content.ends_with('\n');
                for (line_number, line) in content.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let loaded = serde_json::from_str::<StoredChunk>(line)
                        .map_err(|e| AppError::Store(e.to_string()))
                        .and_then(|stored| entries.insert(stored.chunk, stored.embedding));
                    if let Err(e) = loaded {
                        warn!(
                            file = %file_path.display(),
                            line = line_number + 1,
                            error = %e,
                            "Skipping stored chunk"
                        );
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::Store(format!(
                    "Failed to read {}: {}",
                    file_path.display(),
                    e
                )));
            }
        }

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await
            .map_err(|e| {
                AppError::Store(format!("Failed to open {}: {}", file_path.display(), e))
            })?;

        // Terminate a partial last line so the next record starts on its own line
        if needs_newline {
            log.write_all(b"\n").await.map_err(write_error)?;
            log.flush().await.map_err(write_error)?;
        }

        info!(
            path = %file_path.display(),
            chunks = entries.len(),
            "Opened local retrieval store"
        );

        Ok(Self {
            collection: collection.to_string(),
            file_path,
            embedder,
            entries: RwLock::new(entries),
            log: Mutex::new(log),
        })
    }

    /// File holding this collection.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn write_error(e: std::io::Error) -> AppError {
    AppError::Store(format!("Failed to write local store: {}", e))
}

#[async_trait]
impl RetrievalStore for LocalRetrievalStore {
    fn provider_name(&self) -> &'static str {
        "local"
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn add(&self, chunk: &Chunk) -> Result<()> {
        let embedding = self.embedder.embed(&chunk.text).await?;

        let mut log = self.log.lock().await;
        if self.entries.read().contains(&chunk.id) {
            return Err(duplicate_id(&chunk.id));
        }

        let mut line = serde_json::to_string(&StoredChunkRef {
            chunk,
            embedding: &embedding,
        })
        .map_err(|e| AppError::Internal(format!("Failed to serialize chunk: {}", e)))?;
        line.push('\n');

        log.write_all(line.as_bytes()).await.map_err(write_error)?;
        log.flush().await.map_err(write_error)?;

        self.entries.write().insert(chunk.clone(), embedding)?;
        debug!(id = %chunk.id, collection = %self.collection, "Persisted chunk");
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievalMatch>> {
        let query_embedding = self.embedder.embed(text).await?;
        Ok(self.entries.read().search(&query_embedding, top_k))
    }

    async fn clear(&self) -> Result<()> {
        let log = self.log.lock().await;
        log.set_len(0).await.map_err(write_error)?;

        *self.entries.write() = InMemoryCollection::default();
        info!(collection = %self.collection, "Cleared local retrieval store");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
}
