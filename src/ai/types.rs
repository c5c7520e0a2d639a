use crate::models::enums::{ComplianceTag, RiskLevel};

use super::AiError;

/// Text-generation backend. Implementations must be safe to call from many
/// worker threads at once; the dispatcher fans units of work out against a
/// single shared handle.
pub trait GenerativeModel: Send + Sync {
    /// Run one generation call. `system` seeds the model's role, `json_output`
    /// asks the backend for a machine-parseable body. The returned text is
    /// unvalidated; callers promote it through the parser module.
    fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        json_output: bool,
    ) -> Result<String, AiError>;
}

impl GenerativeModel for Box<dyn GenerativeModel> {
    fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        json_output: bool,
    ) -> Result<String, AiError> {
        (**self).generate(system, prompt, json_output)
    }
}

/// A model-proposed requirement after field-level defaulting, before it
/// becomes a persisted row.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementDraft {
    pub title: String,
    pub description: String,
    pub req_type: String,
    pub source: String,
    pub category: String,
    pub priority: String,
}

/// A model-proposed test case that survived cleaning: the identifying trio
/// (test_id, title, description) is non-empty, compliance is restricted to
/// the recognized tag set and risk is canonical.
///
/// `input_example` is the representative input string for the batch report,
/// picked from the model object's candidate fields; `input_data` is the raw
/// value destined for the stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseDraft {
    pub test_id: String,
    pub title: String,
    pub description: String,
    pub input_data: serde_json::Value,
    pub input_example: String,
    pub expected_result: String,
    pub compliance: Vec<ComplianceTag>,
    pub risk: RiskLevel,
}
