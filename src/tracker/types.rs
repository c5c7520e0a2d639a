use serde::Serialize;

use super::TrackerError;

/// Creates one remote issue per call and returns its key. Shared across
/// dispatch workers, so implementations tolerate concurrent calls.
pub trait IssueTracker: Send + Sync {
    fn create_issue(&self, fields: &IssueFields) -> Result<String, TrackerError>;
}

impl IssueTracker for Box<dyn IssueTracker> {
    fn create_issue(&self, fields: &IssueFields) -> Result<String, TrackerError> {
        (**self).create_issue(fields)
    }
}

// ═══════════════════════════════════════════════════════════
// Issue field payloads
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct IssueFields {
    pub project: ProjectRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<IssueRef>,
    pub summary: String,
    pub description: String,
    pub issuetype: IssueTypeRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeRef {
    pub name: String,
}

/// Fields for a parent requirement issue: "{label} - {title}" with the
/// title capped at 100 characters.
pub fn requirement_issue(
    project_key: &str,
    issue_type: &str,
    label: &str,
    title: &str,
    description: &str,
) -> IssueFields {
    IssueFields {
        project: ProjectRef {
            key: project_key.to_string(),
        },
        parent: None,
        summary: format!("{} - {}", label, truncate_chars(title, 100)),
        description: description.to_string(),
        issuetype: IssueTypeRef {
            name: issue_type.to_string(),
        },
    }
}

/// Fields for a test-case subtask under `parent_key`.
pub fn subtask_issue(
    project_key: &str,
    subtask_type: &str,
    parent_key: &str,
    tc_id: &str,
    title: &str,
    description: &str,
) -> IssueFields {
    IssueFields {
        project: ProjectRef {
            key: project_key.to_string(),
        },
        parent: Some(IssueRef {
            key: parent_key.to_string(),
        }),
        summary: format!("TC: {} - {}", tc_id, truncate_chars(title, 100)),
        description: description.to_string(),
        issuetype: IssueTypeRef {
            name: subtask_type.to_string(),
        },
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
