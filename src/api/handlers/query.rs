//! Question answering handler.

use crate::{
    AppState,
    api::extract::ApiJson,
    types::{ErrorResponse, QueryRequest, QueryResponse, Result},
};
use axum::{Json, extract::State};

/// Answer a question from the stored chunks
#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Answer generated", body = QueryResponse),
        (status = 400, description = "Malformed body, empty query or n_results of 0", body = ErrorResponse),
        (status = 502, description = "Language model failed", body = ErrorResponse),
        (status = 503, description = "Retrieval store failed", body = ErrorResponse)
    ),
    tag = "rag"
)]
pub async fn query(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let result = state
        .query_pipeline()
        .answer(&payload.query, payload.n_results)
        .await?;

    Ok(Json(result.into()))
}
