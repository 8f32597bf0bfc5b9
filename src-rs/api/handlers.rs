use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::ingest::{self, download, read_upload};
use crate::parser::{Backend, ParseOptions};
use crate::result::ParseOutput;
use crate::task::{BackgroundScheduler, Task};

pub const SERVICE_NAME: &str = "docgate";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_TASK_LIMIT: usize = 20;
const MAX_TASK_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub scheduler: BackgroundScheduler,
}

#[derive(Debug, Deserialize)]
pub struct ParseUrlRequest {
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub options: ParseOptions,
}

#[derive(Debug, Deserialize, Default)]
pub struct TasksQuery {
    pub limit: Option<usize>,
}

pub async fn handle_root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "endpoints": [
            "GET /health",
            "GET /version",
            "POST /parse",
            "POST /parse_url",
            "POST /parse_async",
            "GET /tasks",
            "GET /tasks/:task_id",
        ],
    }))
}

pub async fn handle_health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let gateway = &state.gateway;
    let models_loaded = gateway.models_loaded();
    let counts = gateway.tasks().counts()?;
    Ok(Json(json!({
        "status": if models_loaded { "healthy" } else { "degraded" },
        "models_loaded": models_loaded,
        "version": SERVICE_VERSION,
        "uptime_seconds": gateway.uptime().as_secs(),
        "capacity": gateway.gate().capacity(),
        "in_flight": gateway.gate().held(),
        "tasks": counts,
    })))
}

pub async fn handle_version(State(state): State<AppState>) -> Json<Value> {
    let gateway = &state.gateway;
    let config = gateway.config();
    let backends: Vec<&str> = Backend::ALL.iter().map(|b| b.as_str()).collect();
    Json(json!({
        "service_version": SERVICE_VERSION,
        "parser_version": gateway.executor().parser_version(),
        "backends_available": backends,
        "execution_mode": gateway.executor().mode().as_str(),
        "config": {
            "max_concurrent_requests": config.max_concurrent_requests,
            "max_file_size_mb": config.max_file_size_mb,
            "task_expire_hours": config.task_expire_hours,
            "models_dir": config.models_dir.display().to_string(),
        },
    }))
}

pub async fn handle_parse(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseOutput>, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let limit = state.gateway.config().max_file_size_bytes();
    let (upload, options) = read_upload(multipart, limit).await?;
    let pixels = state.gateway.config().max_image_pixels();
    let document = ingest::prepare_blocking(upload.bytes, upload.filename, pixels).await?;
    let output = state.gateway.parse_now(document, &options).await?;
    Ok(Json(output))
}

pub async fn handle_parse_url(
    State(state): State<AppState>,
    payload: Result<Json<ParseUrlRequest>, JsonRejection>,
) -> Result<Json<ParseOutput>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    request.options.validate().map_err(ApiError::Validation)?;

    let gateway = &state.gateway;
    let limit = gateway.config().max_file_size_bytes();
    let fetched = download(gateway.http(), &request.url, request.filename.as_deref(), limit).await?;
    let pixels = gateway.config().max_image_pixels();
    let document = ingest::prepare_blocking(fetched.bytes, fetched.filename, pixels).await?;
    let output = gateway.parse_now(document, &request.options).await?;
    Ok(Json(output))
}

pub async fn handle_parse_async(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Task>, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let limit = state.gateway.config().max_file_size_bytes();
    let (upload, options) = read_upload(multipart, limit).await?;
    let pixels = state.gateway.config().max_image_pixels();
    let document = ingest::prepare_blocking(upload.bytes, upload.filename, pixels).await?;
    let task = state.scheduler.submit(document, options)?;
    Ok(Json(task))
}

pub async fn handle_get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.gateway.tasks().get(&task_id)?))
}

pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TASK_LIMIT).clamp(1, MAX_TASK_LIMIT);
    let tasks = state.gateway.tasks().list(limit)?;
    Ok(Json(json!({"tasks": tasks})))
}
