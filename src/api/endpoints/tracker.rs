//! Tracker push and compliance metrics.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::pipeline::{compliance_metrics, ComplianceMetrics, PushReport};

/// `POST /api/v1/tracker/push`: push the requirement/test-case graph to
/// the configured issue tracker.
pub async fn push(State(state): State<AppState>) -> Result<Json<PushReport>, ApiError> {
    let report = state.push.push_traceability().await?;
    Ok(Json(report))
}

/// `GET /api/v1/tracker/compliance-metrics`: tag and risk aggregates over
/// every stored test case.
pub async fn metrics(State(state): State<AppState>) -> Result<Json<ComplianceMetrics>, ApiError> {
    let conn = crate::db::lock_db(&state.db)?;
    let metrics = compliance_metrics(&conn)?;
    Ok(Json(metrics))
}
