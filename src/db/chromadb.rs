//! ChromaDB vector database integration.
//!
//! Talks to a running Chroma server through its v2 REST API
//! (`/api/v2/tenants/{tenant}/databases/{database}/collections/...`). Chroma
//! only embeds text on the Python client side, so embeddings are computed here
//! with the configured [`Embedder`] and sent alongside the documents.
//!
//! # Feature Flag
//!
//! Enabled by default; disable with `--no-default-features`.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::db::ChromaDBStore;
//!
//! let store = ChromaDBStore::new(&config.store, embedder).await?;
//! store.add(&chunk).await?;
//! let matches = store.query("search query", 3).await?;
//! ```

use super::vectorstore::RetrievalStore;
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Chunk, RetrievalMatch, Result, UNKNOWN_SOURCE};
use crate::utils::toml_config::StoreConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::debug;

/// Collection descriptor returned by Chroma.
#[derive(Debug, Deserialize)]
struct CollectionModel {
    id: String,
}

/// Column-oriented result of a Chroma query; one inner list per query embedding.
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

impl QueryResponse {
    /// Flatten the first query's columns into matches.
    fn into_matches(self) -> Vec<RetrievalMatch> {
        let documents = first_row(self.documents);
        let mut metadatas = first_row(self.metadatas).into_iter();
        let mut distances = first_row(self.distances).into_iter();

        documents
            .into_iter()
            .map(|document| {
                let metadata = metadatas.next().flatten().unwrap_or_default();
                let distance = distances.next().flatten();
                RetrievalMatch {
                    text: document.unwrap_or_default(),
                    source: metadata
                        .get("source")
                        .and_then(Value::as_str)
                        .unwrap_or(UNKNOWN_SOURCE)
                        .to_string(),
                    chunk_index: metadata
                        .get("chunk_index")
                        .and_then(Value::as_u64)
                        .unwrap_or(0) as usize,
                    distance,
                }
            })
            .collect()
    }
}

fn first_row<T>(column: Option<Vec<Vec<T>>>) -> Vec<T> {
    column
        .and_then(|rows| rows.into_iter().next())
        .unwrap_or_default()
}

/// ChromaDB-backed retrieval store.
pub struct ChromaDBStore {
    client: reqwest::Client,
    /// `{url}/api/v2/tenants/{tenant}/databases/{database}`
    database_url: String,
    collection: String,
    /// Cached collection id; reset when the collection is recreated
    collection_id: RwLock<Option<String>>,
    embedder: Arc<dyn Embedder>,
}

impl ChromaDBStore {
    /// Connect to the Chroma server at `config.url` and get or create
    /// `config.collection` in the configured tenant and database.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the server cannot be reached.
    pub async fn new(config: &StoreConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let store = Self {
            client,
            database_url: format!(
                "{}/api/v2/tenants/{}/databases/{}",
                config.url.trim_end_matches('/'),
                config.tenant,
                config.database
            ),
            collection: config.collection.clone(),
            collection_id: RwLock::new(None),
            embedder,
        };

        store.collection_id().await?;
        Ok(store)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.database_url, path)
    }

    /// Resolve the collection id, creating the collection if needed.
    async fn collection_id(&self) -> Result<String> {
        let cached = self.collection_id.read().clone();
        if let Some(id) = cached {
            return Ok(id);
        }

        let response = self
            .client
            .post(self.endpoint("collections"))
            .json(&json!({ "name": self.collection, "get_or_create": true }))
            .send()
            .await
            .map_err(|e| AppError::Store(format!("ChromaDB unreachable: {}", e)))?;

        let model: CollectionModel = check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Store(format!("Invalid ChromaDB collection response: {}", e)))?;

        debug!(collection = %self.collection, id = %model.id, "Resolved ChromaDB collection");
        *self.collection_id.write() = Some(model.id.clone());
        Ok(model.id)
    }
}

/// Turn a non-success HTTP status into a store error carrying the body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Store(format!("ChromaDB returned {}: {}", status, body)))
}

#[async_trait]
impl RetrievalStore for ChromaDBStore {
    fn provider_name(&self) -> &'static str {
        "chromadb"
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn add(&self, chunk: &Chunk) -> Result<()> {
        let embedding = self.embedder.embed(&chunk.text).await?;
        let id = self.collection_id().await?;

        let body = json!({
            "ids": [chunk.id],
            "embeddings": [embedding],
            "documents": [chunk.text],
            "metadatas": [{
                "source": chunk.metadata.source,
                "chunk_index": chunk.metadata.chunk_index,
                "file_type": chunk.metadata.file_type.as_str(),
            }],
        });

        let response = self
            .client
            .post(self.endpoint(&format!("collections/{}/add", id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("ChromaDB add failed: {}", e)))?;
        check(response).await?;
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievalMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text).await?;
        let id = self.collection_id().await?;

        let body = json!({
            "query_embeddings": [embedding],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });

        let response = self
            .client
            .post(self.endpoint(&format!("collections/{}/query", id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("ChromaDB query failed: {}", e)))?;

        let result: QueryResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Store(format!("Invalid ChromaDB query response: {}", e)))?;

        Ok(result.into_matches())
    }

    async fn clear(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("collections/{}", self.collection)))
            .send()
            .await
            .map_err(|e| AppError::Store(format!("ChromaDB delete failed: {}", e)))?;
        check(response).await?;

        *self.collection_id.write() = None;
        self.collection_id().await?;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let id = self.collection_id().await?;

        let response = self
            .client
            .get(self.endpoint(&format!("collections/{}/count", id)))
            .send()
            .await
            .map_err(|e| AppError::Store(format!("ChromaDB count failed: {}", e)))?;

        check(response)
            .await?
            .json::<usize>()
            .await
            .map_err(|e| AppError::Store(format!("Invalid ChromaDB count response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::HashingEmbedder;
    use crate::types::{ChunkMetadata, FileType};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DATABASE: &str = "/api/v2/tenants/default_tenant/databases/default_database";

    fn route(suffix: &str) -> String {
        format!("{}/{}", DATABASE, suffix)
    }

    fn store_config(server: &MockServer) -> StoreConfig {
        StoreConfig {
            url: server.uri(),
            ..StoreConfig::default()
        }
    }

    async fn mount_collection(server: &MockServer, id: &str) {
        Mock::given(method("POST"))
            .and(path(route("collections")))
            .and(body_partial_json(json!({ "name": "docs", "get_or_create": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": "docs",
                "metadata": null
            })))
            .mount(server)
            .await;
    }

    async fn create_store(server: &MockServer) -> ChromaDBStore {
        ChromaDBStore::new(&store_config(server), Arc::new(HashingEmbedder::new(8)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_resolves_collection() {
        let server = MockServer::start().await;
        mount_collection(&server, "col-1").await;

        let store = create_store(&server).await;
        assert_eq!(store.collection_id().await.unwrap(), "col-1");
        assert_eq!(store.provider_name(), "chromadb");
    }

    #[tokio::test]
    async fn test_new_fails_when_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(route("collections")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result =
            ChromaDBStore::new(&store_config(&server), Arc::new(HashingEmbedder::new(8))).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_add_sends_metadata() {
        let server = MockServer::start().await;
        mount_collection(&server, "col-1").await;
        Mock::given(method("POST"))
            .and(path(route("collections/col-1/add")))
            .and(body_partial_json(json!({
                "documents": ["Hello world."],
                "metadatas": [{ "source": "a.txt", "chunk_index": 2, "file_type": "txt" }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(true))
            .expect(1)
            .mount(&server)
            .await;

        let store = create_store(&server).await;
        let chunk = Chunk::new(
            "Hello world.",
            ChunkMetadata {
                source: "a.txt".to_string(),
                chunk_index: 2,
                file_type: FileType::Txt,
            },
        );
        store.add(&chunk).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_maps_columns() {
        let server = MockServer::start().await;
        mount_collection(&server, "col-1").await;
        Mock::given(method("POST"))
            .and(path(route("collections/col-1/query")))
            .and(body_partial_json(json!({ "n_results": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": [["a", "b"]],
                "documents": [["First chunk.", "Second chunk."]],
                "metadatas": [[{ "source": "a.txt", "chunk_index": 0 }, null]],
                "distances": [[0.1, 0.4]]
            })))
            .mount(&server)
            .await;

        let store = create_store(&server).await;
        let matches = store.query("chunk", 2).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].source, "a.txt");
        assert_eq!(matches[0].distance, Some(0.1));
        assert_eq!(matches[1].source, UNKNOWN_SOURCE);
        assert_eq!(matches[1].chunk_index, 0);
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let server = MockServer::start().await;
        mount_collection(&server, "col-1").await;
        Mock::given(method("POST"))
            .and(path(route("collections/col-1/query")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": [[]],
                "documents": [[]],
                "metadatas": [[]],
                "distances": [[]]
            })))
            .mount(&server)
            .await;

        let store = create_store(&server).await;
        assert!(store.query("anything", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count() {
        let server = MockServer::start().await;
        mount_collection(&server, "col-1").await;
        Mock::given(method("GET"))
            .and(path(route("collections/col-1/count")))
            .respond_with(ResponseTemplate::new(200).set_body_json(7))
            .mount(&server)
            .await;

        let store = create_store(&server).await;
        assert_eq!(store.count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_clear_deletes_and_recreates() {
        let server = MockServer::start().await;
        mount_collection(&server, "col-1").await;
        Mock::given(method("DELETE"))
            .and(path(route("collections/docs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .expect(1)
            .mount(&server)
            .await;

        let store = create_store(&server).await;
        store.clear().await.unwrap();
        assert_eq!(store.collection_id().await.unwrap(), "col-1");
    }

    #[tokio::test]
    async fn test_custom_tenant_and_database_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/tenants/acme/databases/handbook/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "col-9",
                "name": "docs"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = StoreConfig {
            url: format!("{}/", server.uri()),
            tenant: "acme".to_string(),
            database: "handbook".to_string(),
            ..StoreConfig::default()
        };
        let store = ChromaDBStore::new(&config, Arc::new(HashingEmbedder::new(8)))
            .await
            .unwrap();
        assert_eq!(store.collection_id().await.unwrap(), "col-9");
    }
}
