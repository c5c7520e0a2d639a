//! Document upload, file listing, and semantic search endpoints.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::db::repository;
use crate::index::SearchHit;
use crate::models::FileSummary;
use crate::pipeline::{UploadReport, UploadedDocument};

/// `POST /api/v1/files/upload`: multipart ingestion of requirement and
/// input-example documents.
///
/// Form fields: `requirement_files` (repeatable) and `input_files`
/// (repeatable). Unknown field names are skipped.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>, ApiError> {
    let mut requirement_files = Vec::new();
    let mut input_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let target = match field.name() {
            Some("requirement_files") => &mut requirement_files,
            Some("input_files") => &mut input_files,
            _ => continue,
        };

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        target.push(UploadedDocument {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    let report = state
        .extraction
        .ingest_upload(requirement_files, input_files)
        .await?;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileSummary>,
}

/// `GET /api/v1/files`: uploaded files with their processing status.
pub async fn list(State(state): State<AppState>) -> Result<Json<FileListResponse>, ApiError> {
    let conn = crate::db::lock_db(&state.db)?;
    let files = repository::get_files(&conn)?;
    Ok(Json(FileListResponse { files }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// `GET /api/v1/files/search`: semantic search over indexed documents.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter is required".to_string()))?;
    let limit = params.limit.unwrap_or(5);

    let index = Arc::clone(&state.index);
    let search_query = query.clone();
    let results = tokio::task::spawn_blocking(move || index.search(&search_query, limit))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SearchResponse { query, results }))
}
