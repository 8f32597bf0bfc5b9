use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::gate::GateError;
use crate::parser::ParserError;
use crate::task::TaskError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("server at max capacity ({0} concurrent requests)")]
    CapacityExceeded(usize),

    #[error("{0}")]
    NotFound(String),

    #[error("download failed: {0}")]
    DownloadFailure(String),

    #[error("parse failed: {0}")]
    ParseFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Auth(_) => "auth_error",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::CapacityExceeded(_) => "capacity_exceeded",
            ApiError::NotFound(_) => "not_found",
            ApiError::DownloadFailure(_) => "download_failure",
            ApiError::ParseFailure(_) => "parse_failure",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DownloadFailure(_) => StatusCode::BAD_REQUEST,
            ApiError::ParseFailure(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Full(capacity) => ApiError::CapacityExceeded(capacity),
            GateError::Closed => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ParserError> for ApiError {
    fn from(err: ParserError) -> Self {
        ApiError::ParseFailure(err.to_string())
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(id) => ApiError::NotFound(format!("task not found: {}", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
