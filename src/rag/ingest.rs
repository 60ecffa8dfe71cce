//! Ingestion pipeline: documents and raw text into the retrieval store.
//!
//! Every source goes through the same steps: extract text, chunk it, tag each
//! chunk with its source and position, write the chunks one at a time. Writes
//! are not transactional; chunks stored before a failure stay stored.

use crate::db::RetrievalStore;
use crate::documents::{self, LoadedDocument};
use crate::rag::chunker::TextChunker;
use crate::types::{
    AppError, Chunk, ChunkMetadata, FileType, IngestReport, MANUAL_SOURCE, Result,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Build a chunker after checking the parameters make sense.
///
/// # Errors
///
/// [`AppError::InvalidInput`] if `chunk_size` is 0 or `overlap` is not smaller
/// than `chunk_size`.
pub fn checked_chunker(chunk_size: usize, overlap: usize) -> Result<TextChunker> {
    if chunk_size == 0 {
        return Err(AppError::InvalidInput(
            "chunk_size must be greater than 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(AppError::InvalidInput(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }
    Ok(TextChunker::new(chunk_size, overlap))
}

/// Writes chunked documents into a [`RetrievalStore`].
#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn RetrievalStore>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn RetrievalStore>) -> Self {
        Self { store }
    }

    /// Chunk raw text and store it under the `manual_input` source.
    ///
    /// Returns the generated chunk ids in chunk order.
    pub async fn ingest_text(&self, text: &str, chunker: TextChunker) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("Text must not be empty".to_string()));
        }

        let ids = self
            .write_chunks(chunker.chunk(text), MANUAL_SOURCE, FileType::Manual)
            .await?;

        info!(chunks = ids.len(), "Added manual text");
        Ok(ids)
    }

    /// Load, chunk and store a single file.
    ///
    /// # Errors
    ///
    /// Loader failures surface as [`AppError::UnsupportedFormat`] or
    /// [`AppError::ParseFailure`]; store failures as [`AppError::Store`].
    pub async fn ingest_file(&self, path: &Path, chunker: TextChunker) -> Result<Vec<String>> {
        let document = LoadedDocument::load(path).await?;
        self.ingest_document(&document, chunker).await
    }

    /// Ingest every supported file directly inside `dir`.
    ///
    /// Files that cannot be loaded are reported with 0 chunks. A store failure
    /// aborts the whole run.
    pub async fn ingest_directory(&self, dir: &Path, chunker: TextChunker) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for (file_name, outcome) in documents::parse_directory(dir).await? {
            match outcome {
                Ok(document) => {
                    let ids = self.ingest_document(&document, chunker).await?;
                    report.record(file_name, ids.len());
                }
                // Already logged by the loader
                Err(e) if e.is_document_error() => report.record(file_name, 0),
                Err(e) => return Err(e),
            }
        }

        info!(
            directory = %dir.display(),
            files = report.files.len(),
            total_chunks = report.total_chunks,
            "Directory ingestion complete"
        );
        Ok(report)
    }

    async fn ingest_document(
        &self,
        document: &LoadedDocument,
        chunker: TextChunker,
    ) -> Result<Vec<String>> {
        let ids = self
            .write_chunks(
                chunker.chunk(&document.text),
                &document.file_name,
                document.file_type,
            )
            .await?;

        info!(
            file = %document.file_name,
            file_type = %document.file_type,
            chunks = ids.len(),
            "Ingested document"
        );
        Ok(ids)
    }

    async fn write_chunks(
        &self,
        texts: Vec<String>,
        source: &str,
        file_type: FileType,
    ) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(texts.len());

        for (chunk_index, text) in texts.into_iter().enumerate() {
            let chunk = Chunk::new(
                text,
                ChunkMetadata {
                    source: source.to_string(),
                    chunk_index,
                    file_type,
                },
            );
            self.store.add(&chunk).await?;
            debug!(id = %chunk.id, source, chunk_index, "Stored chunk");
            ids.push(chunk.id);
        }

        Ok(ids)
    }
}
