//! Ingestion handlers: directory embedding and raw text.

use crate::{
    AppState,
    api::extract::ApiJson,
    rag::ingest::checked_chunker,
    types::{AddRequest, AddResponse, EmbedRequest, EmbedResponse, ErrorResponse, Result},
};
use axum::{Json, extract::State};
use std::path::PathBuf;

/// Embed every supported document in a directory
///
/// The body is optional; omitted fields fall back to the configured
/// documents directory and chunking parameters.
#[utoipa::path(
    post,
    path = "/embed",
    request_body(content = EmbedRequest, description = "Optional directory and chunking overrides"),
    responses(
        (status = 200, description = "Directory ingested", body = EmbedResponse),
        (status = 400, description = "Malformed body, missing directory or invalid chunking parameters", body = ErrorResponse),
        (status = 503, description = "Retrieval store failed", body = ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn embed(
    State(state): State<AppState>,
    payload: Option<ApiJson<EmbedRequest>>,
) -> Result<Json<EmbedResponse>> {
    let request = payload.map(|ApiJson(request)| request).unwrap_or_default();
    let rag = &state.config.rag;

    let chunker = checked_chunker(
        request.chunk_size.unwrap_or(rag.chunk_size),
        request.overlap.unwrap_or(rag.chunk_overlap),
    )?;
    let directory = request
        .directory
        .map(PathBuf::from)
        .unwrap_or_else(|| rag.documents_dir.clone());

    let report = state
        .ingestion()
        .ingest_directory(&directory, chunker)
        .await?;

    Ok(Json(report.into()))
}

/// Add raw text as manual input
#[utoipa::path(
    post,
    path = "/add",
    request_body = AddRequest,
    responses(
        (status = 200, description = "Text stored", body = AddResponse),
        (status = 400, description = "Malformed body, empty text or invalid chunking parameters", body = ErrorResponse),
        (status = 503, description = "Retrieval store failed", body = ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddRequest>,
) -> Result<Json<AddResponse>> {
    let rag = &state.config.rag;
    let chunker = checked_chunker(
        payload.chunk_size.unwrap_or(rag.chunk_size),
        payload.overlap.unwrap_or(rag.chunk_overlap),
    )?;

    let ids = state.ingestion().ingest_text(&payload.text, chunker).await?;

    Ok(Json(AddResponse::new(ids)))
}
