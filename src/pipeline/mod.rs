//! Orchestration pipelines: document ingestion, requirement extraction,
//! test-case generation, tracker push and compliance metrics.
//!
//! Each pipeline owns its collaborators (database handle, model client,
//! semantic index, tracker client) and drives fan-out work through the
//! [`Dispatcher`](crate::dispatch::Dispatcher). Blocking model calls never
//! run on the async executor: fan-out goes through dispatch units and
//! single-call flows are plain sync functions bridged by the API layer.

mod extraction;
mod generation;
mod metrics;
mod push;

pub use extraction::{
    ExtractionPipeline, ExtractionReport, LineExtractionReport, UploadReport, UploadedDocument,
};
pub use generation::{
    GenerationPipeline, GenerationReport, GenerationStatus, ImproveReport, RequirementStatus,
    SingleGenerationReport,
};
pub use metrics::{compliance_metrics, ComplianceMetrics, MetricsCase, RiskCounts};
pub use push::{PushPipeline, PushReport};

use thiserror::Error;

use crate::ai::AiError;
use crate::db::DatabaseError;
use crate::document::DocumentError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("File not found or no extracted data")]
    FileNotFound,

    #[error("File '{0}' has already been uploaded")]
    DuplicateFile(String),

    #[error("No requirements found by the AI service")]
    NoRequirementsExtracted,

    #[error("No requirements found for that file")]
    NoRequirementsForFile,

    #[error("Requirement not found")]
    RequirementNotFound,

    #[error("No test cases generated by AI model")]
    NothingGenerated,

    #[error("No test cases found in the database")]
    NoTestCases,

    #[error("Test case not found for given requirement_id and tc_id")]
    TestCaseNotFound,

    #[error("Tracker credentials not configured")]
    TrackerNotConfigured,

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Model(#[from] AiError),
}
