//! HTTP adapter over [`Node`].
//!
//! Validates request bodies, calls the matching node operation and encodes
//! the result as JSON. Errors come back as `{"error": "..."}`.

pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::SchedulerError;
use crate::node::Node;

pub use types::{
    ErrorResponse, RegisterWorkerRequest, RegisterWorkerResponse, SubmitJobRequest,
    SubmitJobResponse,
};

/// Wraps [`SchedulerError`] so handlers can return it directly.
pub struct ApiError(SchedulerError);

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            SchedulerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/jobs", get(list_jobs_handler).post(submit_job_handler))
        .route("/jobs/:id", get(get_job_handler))
        .route("/workers", get(list_workers_handler).post(register_worker_handler))
        .route("/workers/:id/heartbeat", post(heartbeat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}

/// Serve the API on `addr` until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    node: Arc<Node>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Starting HTTP API");

    axum::serve(listener, router(node))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn submit_job_handler(
    State(node): State<Arc<Node>>,
    Json(payload): Json<SubmitJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(SchedulerError::InvalidRequest("name must not be empty".to_string()).into());
    }
    if payload.command.trim().is_empty() {
        return Err(
            SchedulerError::InvalidRequest("command must not be empty".to_string()).into(),
        );
    }

    let job = node
        .submit_job(payload.name, payload.command, payload.args)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitJobResponse {
            job_id: job.id,
            status: job.status,
        }),
    ))
}

async fn get_job_handler(
    State(node): State<Arc<Node>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(node.get_job(&id).await?))
}

async fn list_jobs_handler(State(node): State<Arc<Node>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(node.list_jobs().await?))
}

async fn register_worker_handler(
    State(node): State<Arc<Node>>,
    Json(payload): Json<RegisterWorkerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(SchedulerError::InvalidRequest("name must not be empty".to_string()).into());
    }

    let worker = node
        .register_worker(payload.name, payload.cpu_cores, payload.memory_mb)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterWorkerResponse {
            worker_id: worker.id,
            status: worker.status,
        }),
    ))
}

async fn list_workers_handler(
    State(node): State<Arc<Node>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(node.list_workers().await?))
}

async fn heartbeat_handler(
    State(node): State<Arc<Node>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(node.worker_heartbeat(&id).await?))
}
