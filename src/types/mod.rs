use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Source name attached to chunks that were added as raw text.
pub const MANUAL_SOURCE: &str = "manual_input";

/// Source name reported when a stored chunk carries no source metadata.
pub const UNKNOWN_SOURCE: &str = "unknown";

// ============= Document Types =============

/// Format tag of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Txt,
    Pdf,
    Docx,
    /// Text added directly through the API or CLI
    Manual,
}

impl FileType {
    /// Map a file extension (without the dot, any case) to a supported format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(FileType::Txt),
            "pdf" => Some(FileType::Pdf),
            "docx" => Some(FileType::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Txt => "txt",
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Manual => "manual",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("manual") {
            return Ok(FileType::Manual);
        }
        FileType::from_extension(s)
            .ok_or_else(|| AppError::UnsupportedFormat(format!("Unsupported file type: {}", s)))
    }
}

// ============= Chunk Types =============

/// Metadata stored next to every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub chunk_index: usize,
    pub file_type: FileType,
}

/// An immutable unit of text written to the retrieval store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk with a fresh random id.
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            metadata,
        }
    }
}

/// A chunk returned by a similarity query, best matches first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RetrievalMatch {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
    /// Lower is more similar; `None` when the backend does not report it
    pub distance: Option<f32>,
}

/// Answer produced by the query pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub chunks_used: usize,
}

/// Outcome of a directory ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Chunk count per file name, 0 for files that failed to load
    pub files: BTreeMap<String, usize>,
    pub total_chunks: usize,
}

impl IngestReport {
    pub fn record(&mut self, file_name: impl Into<String>, chunks: usize) {
        self.files.insert(file_name.into(), chunks);
        self.total_chunks = self.files.values().sum();
    }
}

// ============= API Request/Response Types =============

fn default_n_results() -> usize {
    3
}

fn success() -> String {
    "success".to_string()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub chunks_used: usize,
    pub status: String,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            answer: result.answer,
            sources: result.sources,
            chunks_used: result.chunks_used,
            status: success(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmbedRequest {
    /// Directory to ingest; defaults to the configured documents directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmbedResponse {
    pub status: String,
    pub message: String,
    pub details: BTreeMap<String, usize>,
    pub total_chunks: usize,
}

impl From<IngestReport> for EmbedResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            status: success(),
            message: format!(
                "Embedded {} chunks from {} files",
                report.total_chunks,
                report.files.len()
            ),
            details: report.files,
            total_chunks: report.total_chunks,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddResponse {
    pub status: String,
    pub message: String,
    pub ids: Vec<String>,
}

impl AddResponse {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            status: success(),
            message: format!("Text added successfully as {} chunks.", ids.len()),
            ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearResponse {
    pub status: String,
    pub message: String,
}

impl ClearResponse {
    pub fn new(collection: &str) -> Self {
        Self {
            status: success(),
            message: format!("Collection '{}' cleared.", collection),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub status: String,
    pub total_chunks: usize,
    pub collection_name: String,
}

impl StatsResponse {
    pub fn new(total_chunks: usize, collection_name: impl Into<String>) -> Self {
        Self {
            status: success(),
            total_chunks,
            collection_name: collection_name.into(),
        }
    }
}

// ============= Error Types =============

/// Machine-readable error category, serialized into every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    ParseFailure,
    StoreFailure,
    GenerationFailure,
    InvalidInput,
    Configuration,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            AppError::ParseFailure(_) => ErrorKind::ParseFailure,
            AppError::Store(_) => ErrorKind::StoreFailure,
            AppError::Generation(_) => ErrorKind::GenerationFailure,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error only concerns a single document and should not
    /// abort a batch ingestion.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedFormat(_) | AppError::ParseFailure(_)
        )
    }
}

/// Body of every failed API response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match self {
            AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ParseFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            kind: self.kind(),
            message: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Request bodies that are not valid JSON for the endpoint are invalid input.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("docx"), Some(FileType::Docx));
        assert_eq!(FileType::from_extension("txt"), Some(FileType::Txt));
        assert_eq!(FileType::from_extension("md"), None);
        assert_eq!(FileType::from_extension("manual"), None);
    }

    #[test]
    fn test_file_type_parse() {
        assert_eq!("manual".parse::<FileType>().unwrap(), FileType::Manual);
        let err = "xlsx".parse::<FileType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_file_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FileType::Docx).unwrap(), "\"docx\"");
        assert_eq!(serde_json::to_string(&FileType::Manual).unwrap(), "\"manual\"");
    }

    #[test]
    fn test_chunk_ids_are_unique() {
        let metadata = ChunkMetadata {
            source: MANUAL_SOURCE.to_string(),
            chunk_index: 0,
            file_type: FileType::Manual,
        };
        let a = Chunk::new("a", metadata.clone());
        let b = Chunk::new("a", metadata);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_ingest_report_totals() {
        let mut report = IngestReport::default();
        report.record("a.txt", 3);
        report.record("b.pdf", 0);
        report.record("c.docx", 2);
        assert_eq!(report.total_chunks, 5);
        assert_eq!(report.files.len(), 3);

        let response = EmbedResponse::from(report);
        assert_eq!(response.message, "Embedded 5 chunks from 3 files");
        assert_eq!(response.details["b.pdf"], 0);
    }

    #[test]
    fn test_query_request_defaults() {
        let request: QueryRequest = serde_json::from_str(r#"{"query": "hi"}"#).unwrap();
        assert_eq!(request.n_results, 3);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            AppError::Store("down".into()).kind(),
            ErrorKind::StoreFailure
        );
        assert_eq!(
            AppError::Generation("down".into()).kind(),
            ErrorKind::GenerationFailure
        );
        assert!(AppError::ParseFailure("bad".into()).is_document_error());
        assert!(!AppError::Store("down".into()).is_document_error());
    }

    #[test]
    fn test_error_status_codes() {
        let response = AppError::InvalidInput("x".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let response = AppError::Store("x".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);

        let response = AppError::Generation("x".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);
    }
}
