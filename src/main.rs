//! Tracegen server binary: wires settings, database, model and tracker
//! clients into the HTTP router and serves it.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tracegen_lib::ai::{GeminiClient, GenerativeModel};
use tracegen_lib::api::{api_router, AppState};
use tracegen_lib::config::{self, Settings};
use tracegen_lib::db::sqlite::open_database;
use tracegen_lib::index::EmbeddingModel;
use tracegen_lib::tracker::{IssueTracker, JiraClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env();

    if let Some(parent) = settings.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Arc::new(Mutex::new(open_database(&settings.db_path)?));
    info!(path = %settings.db_path.display(), "database ready");

    // Without an API key the server still runs: model calls fail, extraction
    // falls back to default drafts and generation units report errors.
    let model_client = match GeminiClient::from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "model calls will fail until MODEL_API_KEY is set");
            GeminiClient::new(
                &settings.model_base_url,
                "",
                &settings.model_name,
                &settings.embedding_model,
                settings.unit_timeout_secs,
            )
        }
    };
    let model: Arc<dyn GenerativeModel> = Arc::new(model_client.clone());
    let embedder: Box<dyn EmbeddingModel> = Box::new(model_client);

    let tracker: Option<Arc<dyn IssueTracker>> = match JiraClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(_) => {
            info!("tracker credentials not configured; push is disabled");
            None
        }
    };

    let state = AppState::new(db, model, embedder, tracker, &settings);
    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
    }
}
