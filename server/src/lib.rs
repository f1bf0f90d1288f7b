use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, HeaderValue, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use pdfsearch_core::persist::{load_index, IndexPaths};
use pdfsearch_core::{search, InvertedIndex, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    pub paths: IndexPaths,
    /// Current index snapshot. Requests clone the inner `Arc`; a reload swaps it whole.
    pub index: Arc<RwLock<Arc<InvertedIndex>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(paths: IndexPaths, index: InvertedIndex, admin_token: Option<String>) -> Self {
        Self { paths, index: Arc::new(RwLock::new(Arc::new(index))), admin_token }
    }

    pub fn snapshot(&self) -> Arc<InvertedIndex> {
        self.index.read().clone()
    }
}

/// Load the index stored for `folder` and build the router around it.
pub fn build_app(folder: impl AsRef<std::path::Path>) -> Result<Router> {
    let paths = IndexPaths::for_folder(folder);
    let index = load_index(&paths)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState::new(paths, index, admin_token)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(index_reload))
        .with_state(state)
        .layer(cors_from_env())
        .layer(TraceLayer::new_for_http())
}

/// Origins listed in `CORS_ALLOW_ORIGIN` (comma separated); any origin when unset or unparsable.
fn cors_from_env() -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let index = state.snapshot();
    let mut results = search(&index, &params.q);
    let total_hits = results.len();
    results.truncate(params.k.clamp(1, 100));

    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.q, total_hits, took_s, "search");
    Json(SearchResponse { query: params.q, took_s, total_hits, results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let index = state.snapshot();
    match index.doc(doc_id) {
        Some(meta) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "document": meta.name,
            "num_pages": meta.num_pages,
            "num_tokens": meta.num_tokens,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("no document with id {doc_id}"))),
    }
}

async fn index_reload(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let paths = state.paths.clone();
    let loaded = tokio::task::spawn_blocking(move || load_index(&paths))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::warn!(error = %e, "index reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let body = serde_json::json!({ "num_docs": loaded.num_docs(), "num_terms": loaded.num_terms() });
    *state.index.write() = Arc::new(loaded);
    tracing::info!(%body, "index reloaded");
    Ok(Json(body))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
