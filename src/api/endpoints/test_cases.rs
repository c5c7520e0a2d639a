//! Test-case generation, listing, and description improvement.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::db::repository;
use crate::models::TestCase;
use crate::pipeline::{GenerationReport, ImproveReport, SingleGenerationReport};

/// `POST /api/v1/test-cases/generate/file/:file_id`: generate test cases
/// for every requirement of a file, fanned out across the worker pool.
pub async fn generate_for_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<GenerationReport>, ApiError> {
    let report = state.generation.generate_for_file(file_id).await?;
    Ok(Json(report))
}

/// `POST /api/v1/test-cases/generate/requirement/:requirement_id`:
/// generate test cases for one requirement.
pub async fn generate_for_requirement(
    State(state): State<AppState>,
    Path(requirement_id): Path<Uuid>,
) -> Result<Json<SingleGenerationReport>, ApiError> {
    let generation = Arc::clone(&state.generation);
    let report =
        tokio::task::spawn_blocking(move || generation.generate_for_requirement(requirement_id))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct TestCaseListResponse {
    pub test_cases: Vec<TestCase>,
    pub count: usize,
}

/// `GET /api/v1/test-cases`: all stored test cases in requirement order.
pub async fn list(State(state): State<AppState>) -> Result<Json<TestCaseListResponse>, ApiError> {
    let conn = crate::db::lock_db(&state.db)?;
    let test_cases = repository::get_all_test_cases(&conn)?;
    let count = test_cases.len();
    Ok(Json(TestCaseListResponse { test_cases, count }))
}

#[derive(Deserialize)]
pub struct ImproveRequest {
    pub requirement_id: Uuid,
    pub tc_id: String,
    pub user_input: String,
}

/// `POST /api/v1/test-cases/improve`: rewrite one test case's description
/// from user feedback.
pub async fn improve(
    State(state): State<AppState>,
    Json(req): Json<ImproveRequest>,
) -> Result<Json<ImproveReport>, ApiError> {
    let generation = Arc::clone(&state.generation);
    let report = tokio::task::spawn_blocking(move || {
        generation.improve_test_case(req.requirement_id, &req.tc_id, &req.user_input)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(report))
}
