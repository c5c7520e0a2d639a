//! Whole-document requirement extraction and requirement listing.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::db::repository;
use crate::models::Requirement;
use crate::pipeline::ExtractionReport;

/// `POST /api/v1/requirements/:file_id/extract`: run whole-document
/// extraction over a file's stored text.
pub async fn extract(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ExtractionReport>, ApiError> {
    let extraction = Arc::clone(&state.extraction);
    let report = tokio::task::spawn_blocking(move || extraction.extract_from_document(file_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct RequirementListResponse {
    pub requirements: Vec<Requirement>,
    pub count: usize,
}

/// `GET /api/v1/requirements`: all stored requirements, grouped by file
/// and ordered by sequence label.
pub async fn list(State(state): State<AppState>) -> Result<Json<RequirementListResponse>, ApiError> {
    let conn = crate::db::lock_db(&state.db)?;
    let requirements = repository::get_all_requirements(&conn)?;
    let count = requirements.len();
    Ok(Json(RequirementListResponse {
        requirements,
        count,
    }))
}
