//! HTTP server for uploads and summary downloads.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Upload a sales CSV (multipart); `?run_in_background=true` (or `1`, `yes`, `on`) defers processing |
//! | `GET`  | `/results/{result_id}` | Download a stored summary as `text/csv` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Only .csv files are supported" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Malformed query strings and non-multipart upload bodies are reported
//! through the same contract as `bad_request`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser front-ends
//! can upload directly.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use sales_summary_core::store::ResultStore;

use crate::config::Config;
use crate::file_store::LocalFileStore;
use crate::processor::{ProcessFileResponse, UploadProcessor};
use crate::tasks::TaskQueue;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    processor: UploadProcessor,
}

impl AppState {
    pub fn new(processor: UploadProcessor) -> Self {
        Self { processor }
    }

    fn store(&self) -> &Arc<dyn ResultStore> {
        self.processor.store()
    }
}

/// Starts the HTTP server.
///
/// Opens the configured storage root, spawns the background worker, and
/// serves until Ctrl-C. Deferred uploads still queued at shutdown are
/// drained before returning.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr()?;
    let store = LocalFileStore::from_config(config)?;
    info!(root = %store.root().display(), "result storage ready");

    let (tasks, worker) = TaskQueue::spawn();
    let state = AppState::new(UploadProcessor::new(Arc::new(store), tasks));
    let app = build_router(state, config);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let stats = worker.finish().await?;
    info!(
        completed = stats.completed,
        failed = stats.failed,
        "background worker drained"
    );
    Ok(())
}

/// Build the application router with all routes and layers attached.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/results/{result_id}", get(handle_download))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(config.upload.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Storage and processing failures are fatal for the request.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %format!("{:#}", err), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: err.to_string(),
        }
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
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

// ============ POST /upload ============

#[derive(Debug, Default, Deserialize)]
struct UploadParams {
    run_in_background: Option<String>,
}

impl UploadParams {
    fn deferred(&self) -> Result<bool, AppError> {
        match self.run_in_background.as_deref() {
            None => Ok(false),
            Some(raw) => parse_flag(raw).ok_or_else(|| {
                bad_request(format!("run_in_background must be a boolean, got {:?}", raw))
            }),
        }
    }
}

/// Parse a query-string boolean, accepting the usual HTML-form spellings.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Handler for `POST /upload`.
///
/// Takes the first multipart field that carries a filename. The filename
/// must end in `.csv`; this is checked before the body of the field is
/// read, so rejected uploads never reach the aggregator.
async fn handle_upload(
    State(state): State<AppState>,
    params: Result<Query<UploadParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessFileResponse>, AppError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let deferred = params.deferred()?;
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        if !filename.ends_with(".csv") {
            return Err(bad_request("Only .csv files are supported"));
        }

        let upload = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;

        info!(
            filename = %filename,
            bytes = upload.len(),
            deferred,
            "upload received"
        );
        let response = state
            .processor
            .process(upload.to_vec(), deferred)
            .await?;
        return Ok(Json(response));
    }

    Err(bad_request("No file uploaded"))
}

// ============ GET /results/{result_id} ============

/// Handler for `GET /results/{result_id}`.
///
/// Streams back exactly the stored summary bytes.
async fn handle_download(
    State(state): State<AppState>,
    Path(result_id): Path<String>,
) -> Result<Response, AppError> {
    let content = state
        .store()
        .get(&result_id)
        .await?
        .ok_or_else(|| not_found("Result file not found"))?;

    let disposition = format!("attachment; filename=\"aggregated_sales_{}\"", result_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}
