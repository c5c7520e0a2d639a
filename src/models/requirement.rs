use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single structured requirement derived from an uploaded document.
///
/// `req_title_id` is the human-facing sequence label (`REQ-001`, `REQ-002`, ...)
/// assigned in submission order within one file; `requirement_id` is the stable
/// machine key other tables reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub requirement_id: Uuid,
    pub file_id: Uuid,
    pub req_title_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub req_type: String,
    pub source: String,
    pub category: String,
    pub priority: String,
    pub created_at: NaiveDateTime,
}
