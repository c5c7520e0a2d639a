use crate::models::enums::RiskLevel;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated test case. Requirement title and description are denormalized
/// onto the row so tracker pushes and listings never need a join.
///
/// `tc_id` (`TC-001`, ...) is unique only within its requirement; `id` is the
/// global key. `input_data` holds a JSON-serialized example payload and
/// `compliance_tags` a comma-joined list of recognized tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub file_id: Uuid,
    pub req_id: Uuid,
    pub req_title_id: String,
    pub req_title: String,
    pub req_description: String,
    pub tc_id: String,
    pub tc_title: String,
    pub tc_description: String,
    pub expected_result: String,
    pub input_data: String,
    pub compliance_tags: String,
    pub risk: RiskLevel,
    pub created_at: NaiveDateTime,
}
