//! HTTP server for the standards catalog.
//!
//! Serves the search page and the JSON API it consumes. The catalog is built
//! once at startup and published through a [`SharedStore`]; `POST /api/reload`
//! rebuilds it from the configured workbook and swaps it in whole. A
//! workbook missing at startup serves an empty catalog, while a reload that
//! cannot open the workbook fails and keeps the catalog already published.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Search page |
//! | `GET`  | `/api/standards?query=&section=&source=` | Matching records |
//! | `GET`  | `/api/filters` | Section and source vocabularies |
//! | `POST` | `/api/reload` | Rebuild the catalog from the workbook |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Any failure while answering a request, including a panic in a handler,
//! produces:
//!
//! ```json
//! { "error": "An internal server error occurred." }
//! ```
//!
//! with status 500. Details go to the log only.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the page can also be
//! opened from a file or another host.

use std::any::Any;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dataset::{load_dataset, try_load_dataset};
use crate::search::StandardsQuery;
use crate::store::{SharedStore, StandardsStore};

/// Body text of every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<SharedStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<SharedStore>) -> Self {
        Self { config, store }
    }
}

/// Builds the router with all endpoints and middleware.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/", get(handle_index))
        .route("/api/standards", get(handle_standards))
        .route("/api/filters", get(handle_filters))
        .route("/api/reload", post(handle_reload))
        .route("/health", get(handle_health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

/// Builds the catalog from the configured workbook and serves it until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let path = config.workbook.path.clone();
    let dataset = tokio::task::spawn_blocking(move || load_dataset(&path))
        .await
        .context("standards build task failed")?;

    let state = AppState::new(
        Arc::new(config.clone()),
        Arc::new(SharedStore::new(dataset.store)),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!("standards server listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("standards server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Logs `err` and returns the generic 500 response.
fn internal_error(err: impl std::fmt::Display) -> AppError {
    error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: INTERNAL_ERROR_MESSAGE.to_string(),
    }
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    internal_error(format!("handler panicked: {}", detail)).into_response()
}

// ============ GET / ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /api/standards ============

/// Returns the records matching `query`, `section`, and `source`, in catalog order.
async fn handle_standards(
    State(state): State<AppState>,
    Query(query): Query<StandardsQuery>,
) -> Result<Response, AppError> {
    let store = state.store.current().map_err(internal_error)?;
    let results = store.search(&query);
    debug!(
        results = results.len(),
        query = %query.query,
        section = %query.section,
        source = %query.source,
        "standards search"
    );
    Ok(Json(results).into_response())
}

// ============ GET /api/filters ============

#[derive(Serialize)]
struct FiltersResponse<'a> {
    sections: &'a [String],
    sources: &'a [String],
}

async fn handle_filters(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store.current().map_err(internal_error)?;
    Ok(Json(FiltersResponse {
        sections: store.sections(),
        sources: store.sources(),
    })
    .into_response())
}

// ============ POST /api/reload ============

#[derive(Debug, Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ReloadResponse {
    pub records: usize,
    pub sections: usize,
    pub sources: usize,
}

impl ReloadResponse {
    fn for_store(store: &StandardsStore) -> Self {
        Self {
            records: store.len(),
            sections: store.sections().len(),
            sources: store.sources().len(),
        }
    }
}

/// Rebuilds the catalog off the async runtime, then publishes it in one swap.
///
/// A workbook that cannot be opened leaves the current catalog in place.
async fn handle_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let path = state.config.workbook.path.clone();
    let dataset = tokio::task::spawn_blocking(move || try_load_dataset(&path))
        .await
        .map_err(internal_error)?
        .map_err(|e| internal_error(format!("reload failed, keeping current catalog: {}", e)))?;

    let summary = ReloadResponse::for_store(&dataset.store);
    state.store.replace(dataset.store).map_err(internal_error)?;
    info!(
        records = summary.records,
        sections = summary.sections,
        sources = summary.sources,
        "standards catalog reloaded"
    );
    Ok(Json(summary))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
