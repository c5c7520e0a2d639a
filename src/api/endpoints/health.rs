//! Service banner and health check.

use axum::Json;
use serde::Serialize;

use crate::config::{APP_NAME, APP_VERSION};

#[derive(Serialize)]
pub struct BannerResponse {
    pub message: String,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /`: service banner.
pub async fn root() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: format!("{APP_NAME} API"),
        version: APP_VERSION,
        status: "healthy",
    })
}

/// `GET /health`: liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: APP_VERSION,
    })
}
