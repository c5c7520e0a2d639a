//! Test-case generation and description improvement.
//!
//! File-level generation fans one dispatch unit out per stored requirement
//! and aggregates a per-requirement status map; single-requirement
//! generation and description improvement are one-call flows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::{
    improve_prompt, improved_description, test_cases_from_response, test_cases_prompt,
    GenerativeModel, TestCaseDraft,
};
use crate::config::Settings;
use crate::db::{lock_db, repository};
use crate::dispatch::{Dispatcher, Outcome, UnitOfWork};
use crate::models::{FileStatus, Requirement, TestCase};
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Ok,
    Empty,
    Error,
}

/// Per-requirement slot in the generation report.
#[derive(Debug, Clone, Serialize)]
pub struct RequirementStatus {
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_examples: Option<Vec<String>>,
}

impl RequirementStatus {
    fn ok(generated: usize, title: &str, input_examples: Vec<String>) -> Self {
        Self {
            status: GenerationStatus::Ok,
            error: None,
            generated,
            title: Some(title.to_string()),
            input_examples: Some(input_examples),
        }
    }

    fn empty() -> Self {
        Self {
            status: GenerationStatus::Empty,
            error: Some("No test cases".to_string()),
            generated: 0,
            title: None,
            input_examples: None,
        }
    }

    fn error(reason: &str) -> Self {
        Self {
            status: GenerationStatus::Error,
            error: Some(reason.to_string()),
            generated: 0,
            title: None,
            input_examples: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub message: String,
    pub total_testcases_generated: usize,
    pub elapsed_seconds: f64,
    pub per_requirement: HashMap<Uuid, RequirementStatus>,
}

#[derive(Debug, Serialize)]
pub struct SingleGenerationReport {
    pub message: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
pub struct ImproveReport {
    pub requirement_id: Uuid,
    pub tc_id: String,
    pub original_description: String,
    pub improved_description: String,
    pub message: String,
}

pub struct GenerationPipeline {
    db: Arc<Mutex<Connection>>,
    model: Arc<dyn GenerativeModel>,
    dispatcher: Dispatcher,
    unit_timeout: Duration,
    examples_cap: usize,
}

impl GenerationPipeline {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        model: Arc<dyn GenerativeModel>,
        settings: &Settings,
    ) -> Self {
        Self::with_limits(
            db,
            model,
            settings.generation_workers,
            Duration::from_secs(settings.unit_timeout_secs),
            settings.input_examples_per_req,
        )
    }

    pub fn with_limits(
        db: Arc<Mutex<Connection>>,
        model: Arc<dyn GenerativeModel>,
        workers: usize,
        unit_timeout: Duration,
        examples_cap: usize,
    ) -> Self {
        Self {
            db,
            model,
            dispatcher: Dispatcher::new(workers),
            unit_timeout,
            examples_cap,
        }
    }

    /// Generate test cases for every requirement of a file. One dispatch
    /// unit per requirement; a failed or timed-out unit marks its slot
    /// `error` and the remaining requirements still complete.
    pub async fn generate_for_file(
        &self,
        file_id: Uuid,
    ) -> Result<GenerationReport, PipelineError> {
        let (input_data, requirements) = {
            let conn = lock_db(&self.db)?;
            let input = repository::get_input_data(&conn, &file_id)?.unwrap_or_default();
            let requirements = repository::get_requirements_by_file(&conn, &file_id)?;
            (input, requirements)
        };
        if requirements.is_empty() {
            return Err(PipelineError::NoRequirementsForFile);
        }

        let started = Instant::now();
        let mut units = Vec::with_capacity(requirements.len());
        for requirement in &requirements {
            let model = Arc::clone(&self.model);
            let title = requirement.title.clone();
            let description = requirement.description.clone();
            let input = input_data.clone();
            units.push(UnitOfWork::new(
                requirement.requirement_id.to_string(),
                self.unit_timeout,
                move || {
                    let (system, prompt) = test_cases_prompt(&title, &description, &input);
                    let raw = model
                        .generate(Some(&system), &prompt, true)
                        .map_err(|e| e.to_string())?;
                    test_cases_from_response(&raw).map_err(|e| e.to_string())
                },
            ));
        }

        let outcomes = self.dispatcher.dispatch(units).await;

        let now = Utc::now().naive_utc();
        let mut per_requirement = HashMap::with_capacity(requirements.len());
        let mut rows: Vec<TestCase> = Vec::new();
        for requirement in &requirements {
            let key = requirement.requirement_id.to_string();
            let entry = match outcomes.get(&key) {
                Some(Outcome::Success(drafts)) if !drafts.is_empty() => {
                    let new_rows = test_case_rows(file_id, requirement, drafts, now);
                    let examples = input_examples(drafts, self.examples_cap);
                    let entry = RequirementStatus::ok(new_rows.len(), &requirement.title, examples);
                    rows.extend(new_rows);
                    entry
                }
                Some(Outcome::Success(_)) => RequirementStatus::empty(),
                Some(Outcome::Failure(reason)) => {
                    warn!(requirement = %key, reason = %reason, "generation unit failed");
                    RequirementStatus::error(reason)
                }
                None => RequirementStatus::error("no outcome recorded"),
            };
            per_requirement.insert(requirement.requirement_id, entry);
        }

        if !rows.is_empty() {
            let conn = lock_db(&self.db)?;
            repository::save_test_cases(&conn, &rows)?;
            repository::update_file_status(&conn, &file_id, FileStatus::TestCasesGenerated)?;
        }

        let elapsed_seconds = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            file_id = %file_id,
            test_cases = rows.len(),
            elapsed_seconds,
            "test-case generation finished"
        );

        Ok(GenerationReport {
            message: format!(
                "Generated {} test cases for {} requirements",
                rows.len(),
                requirements.len()
            ),
            total_testcases_generated: rows.len(),
            elapsed_seconds,
            per_requirement,
        })
    }

    /// Generate test cases for one requirement with a single model call.
    pub fn generate_for_requirement(
        &self,
        requirement_id: Uuid,
    ) -> Result<SingleGenerationReport, PipelineError> {
        let (requirement, input_data) = {
            let conn = lock_db(&self.db)?;
            let requirement = repository::get_requirement(&conn, &requirement_id)?
                .ok_or(PipelineError::RequirementNotFound)?;
            let input =
                repository::get_input_data(&conn, &requirement.file_id)?.unwrap_or_default();
            (requirement, input)
        };

        let (system, prompt) =
            test_cases_prompt(&requirement.title, &requirement.description, &input_data);
        let raw = self.model.generate(Some(&system), &prompt, true)?;
        let drafts = test_cases_from_response(&raw)?;
        if drafts.is_empty() {
            return Err(PipelineError::NothingGenerated);
        }

        let rows = test_case_rows(
            requirement.file_id,
            &requirement,
            &drafts,
            Utc::now().naive_utc(),
        );
        {
            let conn = lock_db(&self.db)?;
            repository::save_test_cases(&conn, &rows)?;
            repository::update_file_status(
                &conn,
                &requirement.file_id,
                FileStatus::PartiallyTestCasesGenerated,
            )?;
        }

        info!(
            requirement_id = %requirement_id,
            test_cases = rows.len(),
            "test cases generated for one requirement"
        );

        Ok(SingleGenerationReport {
            message: format!(
                "Generated {} test cases for requirement {}",
                rows.len(),
                requirement_id
            ),
            test_cases: rows,
        })
    }

    /// Rewrite a test case's description with the user's guidance. Model
    /// failures or blank answers keep the original; the row is updated
    /// either way.
    pub fn improve_test_case(
        &self,
        requirement_id: Uuid,
        tc_id: &str,
        user_input: &str,
    ) -> Result<ImproveReport, PipelineError> {
        let original = {
            let conn = lock_db(&self.db)?;
            repository::get_test_case_description(&conn, &requirement_id, tc_id)?
        }
        .filter(|description| !description.is_empty())
        .ok_or(PipelineError::TestCaseNotFound)?;

        let (system, prompt) = improve_prompt(&original, user_input);
        let improved = match self.model.generate(Some(&system), &prompt, false) {
            Ok(raw) => improved_description(&raw, &original),
            Err(e) => {
                warn!(error = %e, "improvement call failed; keeping original description");
                original.clone()
            }
        };

        {
            let conn = lock_db(&self.db)?;
            repository::update_test_case_description(&conn, &requirement_id, tc_id, &improved)?;
        }

        Ok(ImproveReport {
            requirement_id,
            tc_id: tc_id.to_string(),
            original_description: original,
            improved_description: improved,
            message: "Test case description improved and updated in DB.".to_string(),
        })
    }
}

/// Promote drafts to rows. A draft without a usable id gets a positional
/// `TC-NNN`.
fn test_case_rows(
    file_id: Uuid,
    requirement: &Requirement,
    drafts: &[TestCaseDraft],
    created_at: NaiveDateTime,
) -> Vec<TestCase> {
    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| {
            let tc_id = if draft.test_id.is_empty() {
                format!("TC-{:03}", i + 1)
            } else {
                draft.test_id.clone()
            };
            TestCase {
                id: Uuid::new_v4(),
                file_id,
                req_id: requirement.requirement_id,
                req_title_id: requirement.req_title_id.clone(),
                req_title: requirement.title.clone(),
                req_description: requirement.description.clone(),
                tc_id,
                tc_title: draft.title.clone(),
                tc_description: draft.description.clone(),
                expected_result: draft.expected_result.clone(),
                input_data: serde_json::to_string(&draft.input_data).unwrap_or_default(),
                compliance_tags: draft
                    .compliance
                    .iter()
                    .map(|tag| tag.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                risk: draft.risk,
                created_at,
            }
        })
        .collect()
}

/// Distinct example inputs across the drafts, first-seen order, capped.
fn input_examples(drafts: &[TestCaseDraft], cap: usize) -> Vec<String> {
    let mut examples: Vec<String> = Vec::new();
    for draft in drafts {
        let example = draft.input_example.trim();
        if !example.is_empty() && !examples.iter().any(|seen| seen == example) {
            examples.push(example.to_string());
        }
    }
    examples.truncate(cap);
    examples
}
