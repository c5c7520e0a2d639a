//! HTTP router: versioned REST routes over the pipelines.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Business routes are nested under `/api/v1`; the banner and health
//! check sit at the root.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::state::AppState;

/// Upload bodies carry whole PDF/DOCX batches, well past axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn api_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/files/upload", post(endpoints::files::upload))
        .route("/files", get(endpoints::files::list))
        .route("/files/search", get(endpoints::files::search))
        .route(
            "/requirements/:file_id/extract",
            post(endpoints::requirements::extract),
        )
        .route("/requirements", get(endpoints::requirements::list))
        .route(
            "/test-cases/generate/file/:file_id",
            post(endpoints::test_cases::generate_for_file),
        )
        .route(
            "/test-cases/generate/requirement/:requirement_id",
            post(endpoints::test_cases::generate_for_requirement),
        )
        .route("/test-cases", get(endpoints::test_cases::list))
        .route("/test-cases/improve", post(endpoints::test_cases::improve))
        .route("/tracker/push", post(endpoints::tracker::push))
        .route(
            "/tracker/compliance-metrics",
            get(endpoints::tracker::metrics),
        )
        .with_state(state);

    Router::new()
        .route("/", get(endpoints::health::root))
        .route("/health", get(endpoints::health::check))
        .nest("/api/v1", v1)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}
