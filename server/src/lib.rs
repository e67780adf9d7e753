use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use docsearch_core::{DocId, EngineConfig, SearchEngine};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

/// Load or build the index described by `config` and serve it.
pub fn build_app(config: &EngineConfig) -> Result<Router> {
    let opened = config.open(false)?;
    let stats = opened.engine.index().stats();
    tracing::info!(
        cache_key = %opened.cache_key,
        status = ?opened.status,
        num_docs = stats.num_docs,
        num_tokens = stats.num_tokens,
        "search engine ready"
    );
    Ok(router(Arc::new(opened.engine)))
}

/// CORS layer from `CORS_ALLOW_ORIGIN` (comma-separated origins). Unset,
/// or no parseable origin, allows any origin.
pub fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow_origin
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
}

pub fn router(engine: Arc<SearchEngine>) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/", get(|| async { "App is working" }))
        .route("/health", get(|| async { "ok" }))
        .route("/documents", get(documents_handler))
        .route("/indexes", get(indexes_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn internal(err: docsearch_core::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "search failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Texts of the documents containing the query phrase.
pub async fn documents_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let start = Instant::now();
    let docs = state.engine.search_documents(&params.query).map_err(internal)?;
    tracing::info!(query = %params.query, hits = docs.len(), took_s = start.elapsed().as_secs_f64(), "documents search");
    Ok(Json(docs))
}

/// Ordinals of the documents containing the query phrase.
pub async fn indexes_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<DocId>>, (StatusCode, String)> {
    let start = Instant::now();
    let ids = state.engine.search_indices(&params.query).map_err(internal)?;
    tracing::info!(query = %params.query, hits = ids.len(), took_s = start.elapsed().as_secs_f64(), "indexes search");
    Ok(Json(ids))
}
