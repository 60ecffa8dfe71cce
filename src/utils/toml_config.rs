//! TOML-based configuration for docrag
//!
//! Settings come from `docrag.toml`; every field has a default, so the file is
//! optional. A handful of `DOCRAG_*` environment variables (also read from a
//! `.env` file) override the file after loading.

use crate::db::StoreBackend;
use crate::rag::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "docrag.toml";

/// Root configuration structure loaded from docrag.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocragConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub rag: RagConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Retrieval Store Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub provider: StoreBackend,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Data directory of the local backend
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Server URL for networked backends
    #[serde(default = "default_store_url")]
    pub url: String,

    /// ChromaDB tenant
    #[serde(default = "default_tenant")]
    pub tenant: String,

    /// ChromaDB database within the tenant
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_collection() -> String {
    "docs".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./db")
}

fn default_store_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tenant() -> String {
    "default_tenant".to_string()
}

fn default_database() -> String {
    "default_database".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreBackend::default(),
            collection: default_collection(),
            path: default_store_path(),
            url: default_store_url(),
            tenant: default_tenant(),
            database: default_database(),
        }
    }
}

// ============= Embeddings Configuration =============

/// Embedding implementation used by the retrieval store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local ONNX model through fastembed (`local-embeddings` feature)
    #[default]
    FastEmbed,
    /// Ollama embedding model at `llm.base_url`
    Ollama,
}

impl EmbeddingProvider {
    /// Model used when `embeddings.model` is not set
    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingProvider::FastEmbed => "all-MiniLM-L6-v2",
            EmbeddingProvider::Ollama => "nomic-embed-text",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Model name; the provider's default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Download directory for fastembed models
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl EmbeddingsConfig {
    /// Configured model, or the provider default
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider.default_model())
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "tinyllama".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_model(),
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_n_results")]
    pub n_results: usize,

    /// Directory ingested by `POST /embed` when the request names none
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_OVERLAP
}

fn default_n_results() -> usize {
    3
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./Documents")
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            n_results: default_n_results(),
            documents_dir: default_documents_dir(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DocragConfig {
    /// Load configuration from a TOML file, apply environment overrides and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config: DocragConfig = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`DocragConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(path)) => {
                warn!(path = %path.display(), "Configuration file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides()?;
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Override file values with `DOCRAG_*` environment variables.
    ///
    /// Variables from a `.env` file in the working directory are loaded first
    /// but never replace variables already set in the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        dotenvy::dotenv().ok();

        if let Ok(host) = std::env::var("DOCRAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DOCRAG_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("DOCRAG_PORT '{}' is not a valid port", port))
            })?;
        }
        if let Ok(url) = std::env::var("DOCRAG_LLM_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("DOCRAG_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("DOCRAG_STORE_URL") {
            self.store.url = url;
        }
        if let Ok(collection) = std::env::var("DOCRAG_COLLECTION") {
            self.store.collection = collection;
        }
        if let Ok(path) = std::env::var("DOCRAG_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.n_results == 0 {
            return Err(ConfigError::ValidationError(
                "rag.n_results must be greater than 0".to_string(),
            ));
        }
        if self.embeddings.model_name().trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embeddings.model must not be empty".to_string(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.collection must not be empty".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"
log_format = "json"

[store]
provider = "chromadb"
url = "http://chroma:8000"
collection = "handbook"
tenant = "acme"

[embeddings]
provider = "ollama"
model = "nomic-embed-text"

[llm]
base_url = "http://ollama:11434"
model = "llama3.2"

[rag]
chunk_size = 800
chunk_overlap = 80
n_results = 5
documents_dir = "/srv/docs"
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config: DocragConfig =
            toml::from_str(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.store.provider, StoreBackend::ChromaDB);
        assert_eq!(config.store.collection, "handbook");
        assert_eq!(config.store.tenant, "acme");
        assert_eq!(config.store.database, "default_database");
        assert_eq!(config.embeddings.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.embeddings.model_name(), "nomic-embed-text");
        assert_eq!(config.llm.model, "llama3.2");
        assert_eq!(config.rag.chunk_size, 800);
        assert_eq!(config.rag.documents_dir, PathBuf::from("/srv/docs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: DocragConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert_eq!(config.store.provider, StoreBackend::Local);
        assert_eq!(config.store.path, PathBuf::from("./db"));
        assert_eq!(config.store.url, "http://localhost:8000");
        assert_eq!(config.store.tenant, "default_tenant");
        assert_eq!(config.store.collection, "docs");
        assert_eq!(config.embeddings.provider, EmbeddingProvider::FastEmbed);
        assert_eq!(config.embeddings.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(config.embeddings.cache_dir, None);
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.model, "tinyllama");
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.rag.n_results, 3);
        assert_eq!(config.rag.documents_dir, PathBuf::from("./Documents"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: DocragConfig = toml::from_str("[rag]\nchunk_size = 200\n").unwrap();
        assert_eq!(config.rag.chunk_size, 200);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validation_overlap_not_smaller_than_chunk_size() {
        let mut config = DocragConfig::default();
        config.rag.chunk_size = 50;
        config.rag.chunk_overlap = 50;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_validation_zero_values() {
        let mut config = DocragConfig::default();
        config.rag.n_results = 0;
        assert!(config.validate().is_err());


        let mut config = DocragConfig::default();
        config.rag.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_names() {
        let mut config = DocragConfig::default();
        config.store.collection = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = DocragConfig::default();
        config.llm.model = String::new();
        assert!(config.validate().is_err());

        let mut config = DocragConfig::default();
        config.embeddings.model = Some(" ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_embedding_model_defaults_follow_provider() {
        let config: DocragConfig = toml::from_str("[embeddings]\nprovider = \"ollama\"\n").unwrap();
        assert_eq!(config.embeddings.model_name(), "nomic-embed-text");

        let config: DocragConfig =
            toml::from_str("[embeddings]\nmodel = \"bge-small-en-v1.5\"\n").unwrap();
        assert_eq!(config.embeddings.provider, EmbeddingProvider::FastEmbed);
        assert_eq!(config.embeddings.model_name(), "bge-small-en-v1.5");
    }

    #[test]
    fn test_load_missing_file() {
        let err = DocragConfig::load("/nonexistent/docrag.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rag\nchunk_size = ").unwrap();

        let err = DocragConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rag]\nchunk_size = 10\nchunk_overlap = 20").unwrap();

        let err = DocragConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
