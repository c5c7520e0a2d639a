use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

use super::types::{IssueFields, IssueTracker};
use super::TrackerError;
use crate::config::Settings;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking client for the JIRA REST v2 issue API.
#[derive(Clone)]
pub struct JiraClient {
    base_url: String,
    email: String,
    api_token: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl JiraClient {
    pub fn new(base_url: &str, email: &str, api_token: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            api_token: api_token.to_string(),
            client,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build a client from settings; fails when credentials are missing.
    pub fn from_settings(settings: &Settings) -> Result<Self, TrackerError> {
        let email = settings.tracker_email.as_deref().ok_or(TrackerError::NotConfigured)?;
        let token = settings
            .tracker_api_token
            .as_deref()
            .ok_or(TrackerError::NotConfigured)?;
        Ok(Self::new(&settings.tracker_base_url, email, token))
    }
}

impl IssueTracker for JiraClient {
    fn create_issue(&self, fields: &IssueFields) -> Result<String, TrackerError> {
        let url = format!("{}/rest/api/2/issue", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    TrackerError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    TrackerError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    TrackerError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TrackerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedIssue = response
            .json()
            .map_err(|e| TrackerError::ResponseParsing(e.to_string()))?;
        Ok(created.key)
    }
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

// ═══════════════════════════════════════════════════════════
// Mock tracker for tests
// ═══════════════════════════════════════════════════════════

/// Scriptable in-memory tracker. Issues get sequential keys; calls whose
/// summary matches a registered needle fail instead. Matching on summary
/// keeps scripted failures deterministic under concurrent dispatch.
pub struct MockTracker {
    counter: AtomicUsize,
    fail_needles: Vec<String>,
    calls: Mutex<Vec<IssueFields>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail_needles: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail any create call whose summary contains `needle`.
    pub fn fail_when(mut self, needle: &str) -> Self {
        self.fail_needles.push(needle.to_string());
        self
    }

    /// Every `create_issue` call seen so far, in call order.
    pub fn calls(&self) -> Vec<IssueFields> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueTracker for MockTracker {
    fn create_issue(&self, fields: &IssueFields) -> Result<String, TrackerError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(fields.clone());
        }

        if self
            .fail_needles
            .iter()
            .any(|needle| fields.summary.contains(needle))
        {
            return Err(TrackerError::Api {
                status: 400,
                body: format!("scripted failure for {}", fields.summary),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}-{}", fields.project.key, n))
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{requirement_issue, subtask_issue};
    use super::*;

    #[test]
    fn requirement_summary_joins_label_and_title() {
        let fields = requirement_issue("KAN", "Task", "REQ-001", "Dose limit check", "desc");
        assert_eq!(fields.summary, "REQ-001 - Dose limit check");
        assert_eq!(fields.issuetype.name, "Task");
        assert!(fields.parent.is_none());
    }

    #[test]
    fn long_titles_are_capped_at_100_chars() {
        let title = "x".repeat(250);
        let fields = requirement_issue("KAN", "Task", "REQ-002", &title, "desc");
        assert_eq!(fields.summary, format!("REQ-002 - {}", "x".repeat(100)));
    }

    #[test]
    fn subtask_carries_parent_key() {
        let fields = subtask_issue("KAN", "Sub-task", "KAN-7", "TC-001", "Overdose alarm", "steps");
        assert_eq!(fields.summary, "TC: TC-001 - Overdose alarm");
        assert_eq!(fields.parent.as_ref().map(|p| p.key.as_str()), Some("KAN-7"));
        assert_eq!(fields.issuetype.name, "Sub-task");
    }

    #[test]
    fn parent_field_is_omitted_from_json_when_absent() {
        let fields = requirement_issue("KAN", "Task", "REQ-001", "Title", "desc");
        let value = serde_json::to_value(&fields).unwrap();
        assert!(value.get("parent").is_none());
        assert_eq!(value["project"]["key"], "KAN");
        assert_eq!(value["issuetype"]["name"], "Task");
    }

    #[test]
    fn mock_tracker_issues_sequential_keys() {
        let tracker = MockTracker::new();
        let fields = requirement_issue("KAN", "Task", "REQ-001", "Title", "desc");
        assert_eq!(tracker.create_issue(&fields).unwrap(), "KAN-1");
        assert_eq!(tracker.create_issue(&fields).unwrap(), "KAN-2");
        assert_eq!(tracker.calls().len(), 2);
    }

    #[test]
    fn mock_tracker_fails_on_matching_summary() {
        let tracker = MockTracker::new().fail_when("TC-009");
        let good = subtask_issue("KAN", "Sub-task", "KAN-1", "TC-001", "ok", "steps");
        let bad = subtask_issue("KAN", "Sub-task", "KAN-1", "TC-009", "boom", "steps");

        assert!(tracker.create_issue(&good).is_ok());
        assert!(matches!(
            tracker.create_issue(&bad),
            Err(TrackerError::Api { status: 400, .. })
        ));
    }

    #[test]
    fn from_settings_requires_credentials() {
        let mut settings = Settings::from_env();
        settings.tracker_email = None;
        settings.tracker_api_token = None;
        assert!(matches!(
            JiraClient::from_settings(&settings),
            Err(TrackerError::NotConfigured)
        ));

        settings.tracker_email = Some("qa@example.com".into());
        settings.tracker_api_token = Some("token".into());
        let client = JiraClient::from_settings(&settings).unwrap();
        assert!(!client.base_url.ends_with('/'));
    }
}
