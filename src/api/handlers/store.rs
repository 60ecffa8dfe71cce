//! Collection management handlers.

use crate::{
    AppState,
    types::{ClearResponse, ErrorResponse, Result, StatsResponse},
};
use axum::{Json, extract::State};
use tracing::info;

/// Delete every stored chunk
#[utoipa::path(
    delete,
    path = "/clear",
    responses(
        (status = 200, description = "Collection cleared", body = ClearResponse),
        (status = 503, description = "Retrieval store failed", body = ErrorResponse)
    ),
    tag = "store"
)]
pub async fn clear(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.store.clear().await?;
    info!(collection = state.store.collection_name(), "Collection cleared");

    Ok(Json(ClearResponse::new(state.store.collection_name())))
}

/// Number of stored chunks
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Collection statistics", body = StatsResponse),
        (status = 503, description = "Retrieval store failed", body = ErrorResponse)
    ),
    tag = "store"
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let total = state.store.count().await?;

    Ok(Json(StatsResponse::new(total, state.store.collection_name())))
}
