use crate::AppState;
use crate::api::{ApiDoc, handlers};
use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use utoipa::OpenApi;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(handlers::query::query))
        .route("/embed", post(handlers::documents::embed))
        .route("/add", post(handlers::documents::add))
        .route("/clear", delete(handlers::store::clear))
        .route("/stats", get(handlers::store::stats))
        .route("/health", get(health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}

async fn health_check() -> &'static str {
    "OK"
}
