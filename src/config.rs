//! Application constants and environment-driven settings.
//!
//! All tunables live here: worker-pool sizes, the per-unit generation
//! timeout, semantic-search depth, and the endpoints/credentials for the
//! model service and the issue tracker. `Settings` is plain data, built
//! once at startup and injected, never read from a global.

use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Tracegen";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `RUST_LOG`-style filter when the env var is unset.
pub fn default_log_filter() -> &'static str {
    "info,tracegen=debug"
}

/// Get the application data directory (~/Tracegen/ on all platforms).
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("Tracegen"),
        None => PathBuf::from("."),
    }
}

/// Default on-disk database path.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("tracegen.db")
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

/// Runtime settings assembled from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP bind address for the API server.
    pub bind_addr: String,
    /// SQLite database path.
    pub db_path: PathBuf,

    /// Base URL of the generative-model REST service.
    pub model_base_url: String,
    /// API key for the model service. `None` switches the extraction
    /// paths to their fallback objects and fails generation units.
    pub model_api_key: Option<String>,
    /// Generation model name.
    pub model_name: String,
    /// Embedding model name.
    pub embedding_model: String,

    /// Issue tracker base URL.
    pub tracker_base_url: String,
    /// Tracker account email. Push is a precondition failure without it.
    pub tracker_email: Option<String>,
    /// Tracker API token.
    pub tracker_api_token: Option<String>,
    /// Tracker project key for created issues.
    pub tracker_project_key: String,
    /// Issue type name for parent requirement issues.
    pub tracker_issue_type: String,
    /// Issue type name for test-case subtasks.
    pub tracker_subtask_type: String,

    /// Worker-pool size for test-case generation dispatch.
    pub generation_workers: usize,
    /// Worker-pool size for tracker-push dispatch. Smaller than the
    /// generation pool; the tracker API is more rate-sensitive.
    pub tracker_workers: usize,
    /// Per-unit timeout for generation/extraction dispatch, seconds.
    pub unit_timeout_secs: u64,
    /// Top-K passages pulled from the semantic index per extraction line.
    pub semantic_top_k: usize,
    /// Cap on deduplicated input examples per requirement in reports.
    pub input_examples_per_req: usize,
}

impl Settings {
    /// Assemble settings from environment variables, with the documented
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("TRACEGEN_BIND", "127.0.0.1:8000"),
            db_path: std::env::var("TRACEGEN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_db_path()),
            model_base_url: env_or(
                "MODEL_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            model_api_key: env_opt("MODEL_API_KEY"),
            model_name: env_or("MODEL_NAME", "gemini-2.0-flash"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-004"),
            tracker_base_url: env_or("TRACKER_BASE", "https://your-domain.atlassian.net"),
            tracker_email: env_opt("TRACKER_EMAIL"),
            tracker_api_token: env_opt("TRACKER_API_TOKEN"),
            tracker_project_key: env_or("TRACKER_PROJECT_KEY", "KAN"),
            tracker_issue_type: env_or("TRACKER_REQ_ISSUE_TYPE", "Task"),
            tracker_subtask_type: env_or("TRACKER_TC_SUBTASK_TYPE", "Sub-task"),
            generation_workers: env_usize("MAX_WORKERS", 12),
            tracker_workers: env_usize("MAX_TRACKER_WORKERS", 5),
            unit_timeout_secs: 60,
            semantic_top_k: 5,
            input_examples_per_req: 3,
        }
    }

    /// Whether the tracker has the credentials push needs.
    pub fn tracker_configured(&self) -> bool {
        self.tracker_email.is_some() && self.tracker_api_token.is_some()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            bind_addr: "127.0.0.1:0".into(),
            db_path: PathBuf::from(":memory:"),
            model_base_url: "http://localhost:9999".into(),
            model_api_key: None,
            model_name: "test-model".into(),
            embedding_model: "test-embed".into(),
            tracker_base_url: "http://localhost:9998".into(),
            tracker_email: None,
            tracker_api_token: None,
            tracker_project_key: "KAN".into(),
            tracker_issue_type: "Task".into(),
            tracker_subtask_type: "Sub-task".into(),
            generation_workers: 12,
            tracker_workers: 5,
            unit_timeout_secs: 60,
            semantic_top_k: 5,
            input_examples_per_req: 3,
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "1.0.0");
    }

    #[test]
    fn default_db_path_under_app_data() {
        let db = default_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("tracegen.db"));
    }

    #[test]
    fn generation_pool_larger_than_tracker_pool() {
        let s = test_settings();
        assert!(s.generation_workers > s.tracker_workers);
    }

    #[test]
    fn tracker_unconfigured_without_credentials() {
        let s = test_settings();
        assert!(!s.tracker_configured());
    }

    #[test]
    fn tracker_configured_with_both_credentials() {
        let mut s = test_settings();
        s.tracker_email = Some("qa@example.com".into());
        s.tracker_api_token = Some("token".into());
        assert!(s.tracker_configured());
    }
}
