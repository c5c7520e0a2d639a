//! Shared state for the HTTP layer.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::ai::GenerativeModel;
use crate::config::Settings;
use crate::index::{EmbeddingModel, SemanticIndex};
use crate::pipeline::{ExtractionPipeline, GenerationPipeline, PushPipeline};
use crate::tracker::IssueTracker;

/// Shared context for all API routes: the database handle, the in-memory
/// semantic index and the three pipelines wired over them.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub index: Arc<SemanticIndex>,
    pub extraction: Arc<ExtractionPipeline>,
    pub generation: Arc<GenerationPipeline>,
    pub push: Arc<PushPipeline>,
}

impl AppState {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        model: Arc<dyn GenerativeModel>,
        embedder: Box<dyn EmbeddingModel>,
        tracker: Option<Arc<dyn IssueTracker>>,
        settings: &Settings,
    ) -> Self {
        let index = Arc::new(SemanticIndex::new(embedder));
        Self {
            extraction: Arc::new(ExtractionPipeline::new(
                Arc::clone(&db),
                Arc::clone(&model),
                Arc::clone(&index),
                settings,
            )),
            generation: Arc::new(GenerationPipeline::new(
                Arc::clone(&db),
                Arc::clone(&model),
                settings,
            )),
            push: Arc::new(PushPipeline::new(Arc::clone(&db), tracker, settings)),
            db,
            index,
        }
    }
}
