//! API error type with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::ai::AiError;
use crate::db::DatabaseError;
use crate::pipeline::PipelineError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Upstream failure: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::Unprocessable(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE",
                detail.clone(),
            ),
            ApiError::Upstream(detail) => (StatusCode::BAD_GATEWAY, "UPSTREAM", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::DuplicateFile(_) | PipelineError::TrackerNotConfigured => {
                ApiError::BadRequest(err.to_string())
            }
            PipelineError::FileNotFound
            | PipelineError::NoRequirementsForFile
            | PipelineError::RequirementNotFound
            | PipelineError::NoTestCases
            | PipelineError::TestCaseNotFound => ApiError::NotFound(err.to_string()),
            PipelineError::NoRequirementsExtracted
            | PipelineError::NothingGenerated
            | PipelineError::Document(_) => ApiError::Unprocessable(err.to_string()),
            PipelineError::Model(ref model_err) => match model_err {
                AiError::ResponseParsing(_) | AiError::EmptyResponse => {
                    ApiError::Unprocessable(err.to_string())
                }
                _ => ApiError::Upstream(err.to_string()),
            },
            PipelineError::Database(_) | PipelineError::Task(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
