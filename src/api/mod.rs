//! HTTP API Handlers and Routes
//!
//! The REST layer over the ingestion and query pipelines, built on Axum.
//!
//! # Module Structure
//!
//! - [`api::extract`](crate::api::extract) - JSON body extractor with tagged rejections
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! - `POST /query` - Answer a question from stored chunks
//! - `POST /embed` - Ingest every supported document in a directory
//! - `POST /add` - Store raw text as manual input
//! - `DELETE /clear` - Drop every stored chunk
//! - `GET /stats` - Chunk count and collection name
//! - `GET /health` - Liveness check
//!
//! Failures answer with `{"status": "error", "kind": ..., "message": ...}` and
//! a status code derived from the error kind. Bodies that cannot be decoded
//! are `invalid_input` (400).
//!
//! # OpenAPI Documentation
//!
//! The generated OpenAPI document is served at `/api-docs/openapi.json`.

/// Request extractors with tagged rejections.
pub mod extract;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    AddRequest, AddResponse, ClearResponse, EmbedRequest, EmbedResponse, ErrorKind,
    ErrorResponse, QueryRequest, QueryResponse, StatsResponse,
};
use utoipa::OpenApi;

/// OpenAPI description of the HTTP API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "docrag",
        description = "Document retrieval-augmented generation server"
    ),
    paths(
        handlers::query::query,
        handlers::documents::embed,
        handlers::documents::add,
        handlers::store::clear,
        handlers::store::stats,
    ),
    components(schemas(
        QueryRequest,
        QueryResponse,
        EmbedRequest,
        EmbedResponse,
        AddRequest,
        AddResponse,
        ClearResponse,
        StatsResponse,
        ErrorResponse,
        ErrorKind,
    )),
    tags(
        (name = "rag", description = "Question answering"),
        (name = "documents", description = "Document ingestion"),
        (name = "store", description = "Collection management")
    )
)]
pub struct ApiDoc;
