//! Document ingestion and requirement extraction.
//!
//! Upload ingestion parses every submitted document, vectorizes requirement
//! documents into the semantic index and fans each input line out as a
//! dispatch unit that drafts one candidate requirement. Whole-document
//! extraction re-reads a stored file and asks the model for every
//! requirement it can find in a single pass.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::{
    contextual_requirement_prompt, document_requirements_prompt, fallback_requirement,
    requirement_from_context_response, requirements_from_document_response, GenerativeModel,
    RequirementDraft,
};
use crate::config::Settings;
use crate::db::{lock_db, repository};
use crate::dispatch::{Dispatcher, Outcome, UnitOfWork};
use crate::document;
use crate::index::{DocMetadata, SemanticIndex};
use crate::models::{FileStatus, Requirement, StoredFile};
use crate::pipeline::PipelineError;

/// A file received from the client, still as raw bytes.
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub file_ids: Vec<Uuid>,
    pub filenames: Vec<String>,
    pub message: String,
}

/// Outcome of fanning input lines out to the model: the requirement rows
/// that survived, plus how many lines were dropped.
#[derive(Debug)]
pub struct LineExtractionReport {
    pub accepted: Vec<Requirement>,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct ExtractionReport {
    pub message: String,
    pub requirement_count: usize,
    pub requirements: Vec<Requirement>,
}

pub struct ExtractionPipeline {
    db: Arc<Mutex<Connection>>,
    model: Arc<dyn GenerativeModel>,
    index: Arc<SemanticIndex>,
    dispatcher: Dispatcher,
    unit_timeout: Duration,
    semantic_top_k: usize,
}

impl ExtractionPipeline {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        model: Arc<dyn GenerativeModel>,
        index: Arc<SemanticIndex>,
        settings: &Settings,
    ) -> Self {
        Self::with_limits(
            db,
            model,
            index,
            settings.generation_workers,
            Duration::from_secs(settings.unit_timeout_secs),
            settings.semantic_top_k,
        )
    }

    pub fn with_limits(
        db: Arc<Mutex<Connection>>,
        model: Arc<dyn GenerativeModel>,
        index: Arc<SemanticIndex>,
        workers: usize,
        unit_timeout: Duration,
        semantic_top_k: usize,
    ) -> Self {
        Self {
            db,
            model,
            index,
            dispatcher: Dispatcher::new(workers),
            unit_timeout,
            semantic_top_k,
        }
    }

    /// Ingest one upload batch. Requirement documents are concatenated and
    /// vectorized, input documents are split into lines and each line drafts
    /// a requirement through the model. Everything lands under a single new
    /// file id.
    pub async fn ingest_upload(
        &self,
        requirement_files: Vec<UploadedDocument>,
        input_files: Vec<UploadedDocument>,
    ) -> Result<UploadReport, PipelineError> {
        let file_id = Uuid::new_v4();
        let requirement_count = requirement_files.len();
        let input_count = input_files.len();

        self.reject_duplicates(&requirement_files, &input_files)?;

        let all_names: Vec<String> = requirement_files
            .iter()
            .chain(&input_files)
            .map(|doc| doc.filename.clone())
            .collect();

        let (req_names, req_texts) = extract_all(requirement_files).await?;
        let (_, input_texts) = extract_all(input_files).await?;

        let requirement_content = req_texts.join("\n\n");
        let joined_req_names = req_names.join(",");

        let mut filenames = Vec::new();
        if requirement_count > 0 {
            filenames.push(joined_req_names.clone());
            self.vectorize(file_id, &requirement_content, &joined_req_names)
                .await;
        }

        let mut lines = Vec::new();
        for text in &input_texts {
            for line in text.replace('\r', "").lines() {
                lines.push(line.to_string());
            }
        }

        let extraction = self.extract_lines(file_id, lines).await;
        if extraction.failed > 0 {
            warn!(
                file_id = %file_id,
                failed = extraction.failed,
                "input lines dropped during extraction"
            );
        }

        {
            let conn = lock_db(&self.db)?;
            let file = StoredFile::new(
                file_id,
                all_names.join(","),
                requirement_content,
                input_texts.join("\n\n"),
            );
            repository::insert_file(&conn, &file)?;
            if !extraction.accepted.is_empty() {
                repository::save_requirements(&conn, &extraction.accepted)?;
            }
        }

        info!(
            file_id = %file_id,
            requirements = extraction.accepted.len(),
            "upload ingested"
        );

        Ok(UploadReport {
            file_ids: vec![file_id],
            filenames,
            message: format!(
                "Success! {requirement_count} requirement documents and {input_count} input \
                 files were processed. Documents have been vectorized for semantic search."
            ),
        })
    }

    /// Draft one requirement per non-blank input line. Each line becomes a
    /// dispatch unit that searches the index for context and asks the model
    /// for a structured draft. Lines whose unit times out or panics are
    /// dropped and counted; accepted drafts are numbered `REQ-NNN` densely
    /// in submission order.
    pub async fn extract_lines(&self, file_id: Uuid, lines: Vec<String>) -> LineExtractionReport {
        let lines: Vec<String> = lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return LineExtractionReport {
                accepted: Vec::new(),
                failed: 0,
            };
        }

        let mut units = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let model = Arc::clone(&self.model);
            let index = Arc::clone(&self.index);
            let top_k = self.semantic_top_k;
            let line = line.clone();
            units.push(UnitOfWork::new(
                format!("line-{position}"),
                self.unit_timeout,
                move || Ok(draft_requirement(model.as_ref(), &index, &line, top_k)),
            ));
        }

        let outcomes = self.dispatcher.dispatch(units).await;

        let now = Utc::now().naive_utc();
        let mut accepted = Vec::new();
        let mut failed = 0usize;
        for position in 0..lines.len() {
            match outcomes.get(&format!("line-{position}")) {
                Some(Outcome::Success(draft)) => {
                    accepted.push(requirement_row(file_id, accepted.len() + 1, draft, now));
                }
                Some(Outcome::Failure(reason)) => {
                    failed += 1;
                    warn!(line = position, reason = %reason, "extraction unit failed; line dropped");
                }
                None => failed += 1,
            }
        }

        LineExtractionReport { accepted, failed }
    }

    /// Extract every requirement the model finds in a stored file's document
    /// text, save the rows and mark the file extracted.
    pub fn extract_from_document(&self, file_id: Uuid) -> Result<ExtractionReport, PipelineError> {
        let document_text = {
            let conn = lock_db(&self.db)?;
            repository::get_file_data(&conn, &file_id)?
        }
        .ok_or(PipelineError::FileNotFound)?;

        let prompt = document_requirements_prompt(&document_text);
        let drafts = match self.model.generate(None, &prompt, true) {
            Ok(raw) => match requirements_from_document_response(&raw) {
                Ok(drafts) => drafts,
                Err(e) => {
                    warn!(file_id = %file_id, error = %e, "document answer unusable; using fallback draft");
                    vec![fallback_requirement()]
                }
            },
            Err(e) => {
                warn!(file_id = %file_id, error = %e, "document extraction call failed; using fallback draft");
                vec![fallback_requirement()]
            }
        };
        if drafts.is_empty() {
            return Err(PipelineError::NoRequirementsExtracted);
        }

        let now = Utc::now().naive_utc();
        let requirements: Vec<Requirement> = drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| requirement_row(file_id, i + 1, draft, now))
            .collect();

        {
            let conn = lock_db(&self.db)?;
            repository::save_requirements(&conn, &requirements)?;
            repository::update_file_status(&conn, &file_id, FileStatus::FeaturesExtracted)?;
        }

        info!(file_id = %file_id, count = requirements.len(), "requirements extracted from document");

        Ok(ExtractionReport {
            message: format!(
                "Extracted and saved {} requirements for file {}",
                requirements.len(),
                file_id
            ),
            requirement_count: requirements.len(),
            requirements,
        })
    }

    /// Every name ever stored counts, including names inside comma-joined
    /// upload batches.
    fn reject_duplicates(
        &self,
        requirement_files: &[UploadedDocument],
        input_files: &[UploadedDocument],
    ) -> Result<(), PipelineError> {
        let conn = lock_db(&self.db)?;
        let stored = repository::get_files(&conn)?;
        let known: HashSet<String> = stored
            .iter()
            .flat_map(|file| file.filename.split(','))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        for doc in requirement_files.iter().chain(input_files) {
            if known.contains(doc.filename.as_str()) {
                return Err(PipelineError::DuplicateFile(doc.filename.clone()));
            }
        }
        Ok(())
    }

    /// Store requirement text in the semantic index. Failures are logged and
    /// ingestion continues without vector context.
    async fn vectorize(&self, file_id: Uuid, content: &str, filenames: &str) {
        let index = Arc::clone(&self.index);
        let content = content.to_string();
        let metadata = DocMetadata::requirement(filenames);
        let stored =
            tokio::task::spawn_blocking(move || index.store_document(&content, metadata)).await;
        match stored {
            Ok(Ok(chunks)) => {
                info!(file_id = %file_id, chunks, "requirement documents vectorized")
            }
            Ok(Err(e)) => {
                warn!(file_id = %file_id, error = %e, "vectorization failed; continuing without semantic context")
            }
            Err(e) => {
                warn!(file_id = %file_id, error = %e, "vectorization task failed; continuing without semantic context")
            }
        }
    }
}

/// Parse every document on a blocking thread, preserving order.
async fn extract_all(
    docs: Vec<UploadedDocument>,
) -> Result<(Vec<String>, Vec<String>), PipelineError> {
    let mut names = Vec::with_capacity(docs.len());
    let mut texts = Vec::with_capacity(docs.len());
    for doc in docs {
        let (name, text) = tokio::task::spawn_blocking(move || {
            document::extract_text(&doc.filename, &doc.bytes).map(|text| (doc.filename, text))
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;
        names.push(name);
        texts.push(text);
    }
    Ok((names, texts))
}

/// Search for context and draft a requirement for one input line. Model and
/// search failures degrade to the generic fallback draft rather than losing
/// the line.
fn draft_requirement(
    model: &dyn GenerativeModel,
    index: &SemanticIndex,
    line: &str,
    top_k: usize,
) -> RequirementDraft {
    let contexts: Vec<String> = match index.search(line, top_k) {
        Ok(hits) => hits.into_iter().map(|hit| hit.content).collect(),
        Err(e) => {
            warn!(error = %e, "semantic search failed; drafting without context");
            Vec::new()
        }
    };

    let prompt = contextual_requirement_prompt(line, &contexts);
    match model.generate(None, &prompt, true) {
        Ok(raw) => requirement_from_context_response(&raw),
        Err(e) => {
            warn!(error = %e, "contextual extraction failed; using fallback draft");
            fallback_requirement()
        }
    }
}

fn requirement_row(
    file_id: Uuid,
    sequence: usize,
    draft: &RequirementDraft,
    created_at: NaiveDateTime,
) -> Requirement {
    Requirement {
        requirement_id: Uuid::new_v4(),
        file_id,
        req_title_id: format!("REQ-{sequence:03}"),
        title: draft.title.clone(),
        description: draft.description.clone(),
        req_type: draft.req_type.clone(),
        source: draft.source.clone(),
        category: draft.category.clone(),
        priority: draft.priority.clone(),
        created_at,
    }
}
