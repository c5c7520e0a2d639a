//! Traceability push: every stored test case goes to the issue tracker,
//! grouped under one parent issue per requirement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::db::{lock_db, repository};
use crate::dispatch::{Dispatcher, Outcome, UnitOfWork};
use crate::models::TestCase;
use crate::pipeline::PipelineError;
use crate::tracker::{requirement_issue, subtask_issue, IssueTracker};

/// A whole requirement group (parent plus sequential subtasks) must finish
/// within this window.
const GROUP_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Serialize)]
pub struct PushReport {
    pub message: String,
    pub requirements_pushed: usize,
    pub requirements_considered: usize,
    pub issue_map: HashMap<String, String>,
}

/// One test case flattened for the tracker, with the description composed
/// from steps, expected result and input data.
#[derive(Debug, Clone)]
struct PushRecord {
    req_title: String,
    req_description: String,
    tc_id: String,
    tc_title: String,
    tc_description: String,
}

pub struct PushPipeline {
    db: Arc<Mutex<Connection>>,
    tracker: Option<Arc<dyn IssueTracker>>,
    dispatcher: Dispatcher,
    group_timeout: Duration,
    project_key: String,
    issue_type: String,
    subtask_type: String,
}

impl PushPipeline {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        tracker: Option<Arc<dyn IssueTracker>>,
        settings: &Settings,
    ) -> Self {
        Self::with_options(
            db,
            tracker,
            settings.tracker_workers,
            Duration::from_secs(GROUP_TIMEOUT_SECS),
            settings.tracker_project_key.clone(),
            settings.tracker_issue_type.clone(),
            settings.tracker_subtask_type.clone(),
        )
    }

    pub fn with_options(
        db: Arc<Mutex<Connection>>,
        tracker: Option<Arc<dyn IssueTracker>>,
        workers: usize,
        group_timeout: Duration,
        project_key: impl Into<String>,
        issue_type: impl Into<String>,
        subtask_type: impl Into<String>,
    ) -> Self {
        Self {
            db,
            tracker,
            dispatcher: Dispatcher::new(workers),
            group_timeout,
            project_key: project_key.into(),
            issue_type: issue_type.into(),
            subtask_type: subtask_type.into(),
        }
    }

    /// Push every stored test case. Requirement groups run concurrently,
    /// each as one dispatch unit; inside a group the parent issue is created
    /// first and the subtasks follow sequentially. A failed group is logged
    /// and left out of the map without touching the others.
    pub async fn push_traceability(&self) -> Result<PushReport, PipelineError> {
        let tracker = self
            .tracker
            .as_ref()
            .ok_or(PipelineError::TrackerNotConfigured)?;

        let cases = {
            let conn = lock_db(&self.db)?;
            repository::get_all_test_cases(&conn)?
        };
        if cases.is_empty() {
            return Err(PipelineError::NoTestCases);
        }
        let total_cases = cases.len();

        let groups = group_by_requirement(&cases);
        let considered = groups.len();

        let mut units = Vec::with_capacity(groups.len());
        for (label, group) in &groups {
            let tracker = Arc::clone(tracker);
            let project_key = self.project_key.clone();
            let issue_type = self.issue_type.clone();
            let subtask_type = self.subtask_type.clone();
            let label = label.clone();
            let group = group.clone();
            units.push(UnitOfWork::new(
                label.clone(),
                self.group_timeout,
                move || {
                    push_group(
                        tracker.as_ref(),
                        &project_key,
                        &issue_type,
                        &subtask_type,
                        &label,
                        &group,
                    )
                },
            ));
        }

        let outcomes = self.dispatcher.dispatch(units).await;

        let mut issue_map = HashMap::new();
        for (label, _) in &groups {
            match outcomes.get(label.as_str()) {
                Some(Outcome::Success(parent_key)) => {
                    issue_map.insert(label.clone(), parent_key.clone());
                }
                Some(Outcome::Failure(reason)) => {
                    warn!(requirement = %label, reason = %reason, "requirement group failed; left out of the push map");
                }
                None => {}
            }
        }

        info!(
            pushed = issue_map.len(),
            considered, "traceability push finished"
        );

        Ok(PushReport {
            message: format!("Successfully pushed {total_cases} test cases to the issue tracker"),
            requirements_pushed: issue_map.len(),
            requirements_considered: considered,
            issue_map,
        })
    }
}

/// Create the requirement's parent issue, then its subtasks in stored
/// order. The parent key is the unit's result; any failure fails the whole
/// group, and issues already created stay behind on the tracker.
fn push_group(
    tracker: &dyn IssueTracker,
    project_key: &str,
    issue_type: &str,
    subtask_type: &str,
    label: &str,
    group: &[PushRecord],
) -> Result<String, String> {
    let first = group
        .first()
        .ok_or_else(|| "empty requirement group".to_string())?;

    let parent = requirement_issue(
        project_key,
        issue_type,
        label,
        &first.req_title,
        &first.req_description,
    );
    let parent_key = tracker.create_issue(&parent).map_err(|e| e.to_string())?;
    debug!(requirement = %label, issue = %parent_key, "created requirement issue");

    for record in group {
        let fields = subtask_issue(
            project_key,
            subtask_type,
            &parent_key,
            &record.tc_id,
            &record.tc_title,
            &record.tc_description,
        );
        let subtask_key = tracker.create_issue(&fields).map_err(|e| e.to_string())?;
        debug!(tc = %record.tc_id, issue = %subtask_key, "created test-case subtask");
    }

    Ok(parent_key)
}

fn push_record(case: &TestCase) -> PushRecord {
    PushRecord {
        req_title: case.req_title.clone(),
        req_description: case.req_description.clone(),
        tc_id: case.tc_id.clone(),
        tc_title: case.tc_title.clone(),
        tc_description: format!(
            "Steps:\n{}\nExpected Result:\n{}\nInput Data:\n{}",
            case.tc_description, case.expected_result, case.input_data
        ),
    }
}

/// Group rows under their requirement label, keeping first-seen group order
/// and in-group row order.
fn group_by_requirement(cases: &[TestCase]) -> Vec<(String, Vec<PushRecord>)> {
    let mut groups: Vec<(String, Vec<PushRecord>)> = Vec::new();
    for case in cases {
        let record = push_record(case);
        match groups
            .iter_mut()
            .find(|(label, _)| *label == case.req_title_id)
        {
            Some((_, group)) => group.push(record),
            None => groups.push((case.req_title_id.clone(), vec![record])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Requirement, RiskLevel, StoredFile};
    use crate::tracker::MockTracker;
    use chrono::Utc;
    use uuid::Uuid;

    fn memory_db() -> Arc<Mutex<Connection>> {
        Arc::new(Mutex::new(open_memory_database().unwrap()))
    }

    fn seed_file(db: &Arc<Mutex<Connection>>) -> Uuid {
        let id = Uuid::new_v4();
        let conn = db.lock().unwrap();
        repository::insert_file(
            &conn,
            &StoredFile::new(id, "seed.txt".into(), "doc".into(), "input".into()),
        )
        .unwrap();
        id
    }

    fn seed_requirement(
        db: &Arc<Mutex<Connection>>,
        file_id: Uuid,
        label: &str,
        title: &str,
    ) -> Uuid {
        let requirement = Requirement {
            requirement_id: Uuid::new_v4(),
            file_id,
            req_title_id: label.into(),
            title: title.into(),
            description: format!("{title} description"),
            req_type: "Functional".into(),
            source: "AI Extracted".into(),
            category: "General".into(),
            priority: "Medium".into(),
            created_at: Utc::now().naive_utc(),
        };
        let conn = db.lock().unwrap();
        repository::insert_requirement(&conn, &requirement).unwrap();
        requirement.requirement_id
    }

    fn seed_case(
        db: &Arc<Mutex<Connection>>,
        file_id: Uuid,
        req_id: Uuid,
        label: &str,
        req_title: &str,
        tc_id: &str,
        tc_title: &str,
    ) {
        let case = TestCase {
            id: Uuid::new_v4(),
            file_id,
            req_id,
            req_title_id: label.into(),
            req_title: req_title.into(),
            req_description: format!("{req_title} description"),
            tc_id: tc_id.into(),
            tc_title: tc_title.into(),
            tc_description: "Do the thing".into(),
            expected_result: "It works".into(),
            input_data: "{}".into(),
            compliance_tags: "FDA".into(),
            risk: RiskLevel::Low,
            created_at: Utc::now().naive_utc(),
        };
        let conn = db.lock().unwrap();
        repository::insert_test_case(&conn, &case).unwrap();
    }

    fn push_pipeline(
        db: Arc<Mutex<Connection>>,
        tracker: MockTracker,
    ) -> (PushPipeline, Arc<MockTracker>) {
        let tracker = Arc::new(tracker);
        let pipeline = PushPipeline::with_options(
            db,
            Some(Arc::clone(&tracker) as Arc<dyn IssueTracker>),
            2,
            Duration::from_secs(5),
            "KAN",
            "Task",
            "Sub-task",
        );
        (pipeline, tracker)
    }

    #[tokio::test]
    async fn push_creates_one_parent_per_requirement() {
        let db = memory_db();
        let file_id = seed_file(&db);
        let req_a = seed_requirement(&db, file_id, "REQ-001", "Checkout");
        let req_b = seed_requirement(&db, file_id, "REQ-002", "Inventory");
        seed_case(&db, file_id, req_a, "REQ-001", "Checkout", "TC-001", "Add to cart");
        seed_case(&db, file_id, req_a, "REQ-001", "Checkout", "TC-002", "Pay by card");
        seed_case(&db, file_id, req_b, "REQ-002", "Inventory", "TC-001", "Restock");

        let (pipeline, tracker) = push_pipeline(db, MockTracker::new());
        let report = pipeline.push_traceability().await.unwrap();

        assert_eq!(report.requirements_considered, 2);
        assert_eq!(report.requirements_pushed, 2);
        assert_eq!(
            report.message,
            "Successfully pushed 3 test cases to the issue tracker"
        );
        assert!(report.issue_map.contains_key("REQ-001"));
        assert!(report.issue_map.contains_key("REQ-002"));

        let calls = tracker.calls();
        assert_eq!(calls.len(), 5);

        let parent = calls
            .iter()
            .find(|call| call.summary == "REQ-001 - Checkout")
            .unwrap();
        assert!(parent.parent.is_none());
        assert_eq!(parent.issuetype.name, "Task");

        let subtask = calls
            .iter()
            .find(|call| call.summary == "TC: TC-001 - Add to cart")
            .unwrap();
        assert_eq!(subtask.issuetype.name, "Sub-task");
        assert_eq!(
            subtask.parent.as_ref().map(|p| p.key.as_str()),
            report.issue_map.get("REQ-001").map(String::as_str)
        );
        assert_eq!(
            subtask.description,
            "Steps:\nDo the thing\nExpected Result:\nIt works\nInput Data:\n{}"
        );
    }

    #[tokio::test]
    async fn a_failed_subtask_fails_only_its_group() {
        let db = memory_db();
        let file_id = seed_file(&db);
        let req_a = seed_requirement(&db, file_id, "REQ-001", "Checkout");
        let req_b = seed_requirement(&db, file_id, "REQ-002", "Inventory");
        seed_case(&db, file_id, req_a, "REQ-001", "Checkout", "TC-001", "Add to cart");
        seed_case(&db, file_id, req_a, "REQ-001", "Checkout", "TC-002", "Pay by card");
        seed_case(&db, file_id, req_a, "REQ-001", "Checkout", "TC-003", "Refund");
        seed_case(&db, file_id, req_b, "REQ-002", "Inventory", "TC-001", "Restock");
        seed_case(&db, file_id, req_b, "REQ-002", "Inventory", "TC-002", "Poison pill");

        let (pipeline, tracker) =
            push_pipeline(db, MockTracker::new().fail_when("Poison pill"));
        let report = pipeline.push_traceability().await.unwrap();

        assert_eq!(report.requirements_considered, 2);
        assert_eq!(report.requirements_pushed, 1);
        assert_eq!(
            report.message,
            "Successfully pushed 5 test cases to the issue tracker"
        );

        let parent_key = report.issue_map.get("REQ-001").cloned().unwrap();
        assert!(parent_key.starts_with("KAN-"));
        assert!(!report.issue_map.contains_key("REQ-002"));

        let calls = tracker.calls();
        for title in ["Add to cart", "Pay by card", "Refund"] {
            let call = calls
                .iter()
                .find(|call| call.summary.contains(title))
                .unwrap();
            assert_eq!(
                call.parent.as_ref().map(|p| p.key.as_str()),
                Some(parent_key.as_str())
            );
        }

        // The failed group got as far as the poisoned subtask, in order.
        let pos = |needle: &str| {
            calls
                .iter()
                .position(|call| call.summary.contains(needle))
                .unwrap()
        };
        assert!(pos("REQ-002 - Inventory") < pos("Restock"));
        assert!(pos("Restock") < pos("Poison pill"));
    }

    #[tokio::test]
    async fn push_requires_stored_test_cases() {
        let db = memory_db();
        let (pipeline, _tracker) = push_pipeline(db, MockTracker::new());

        let err = pipeline.push_traceability().await.unwrap_err();
        assert!(matches!(err, PipelineError::NoTestCases));
    }

    #[tokio::test]
    async fn push_requires_a_configured_tracker() {
        let db = memory_db();
        let pipeline = PushPipeline::with_options(
            db,
            None,
            2,
            Duration::from_secs(5),
            "KAN",
            "Task",
            "Sub-task",
        );

        let err = pipeline.push_traceability().await.unwrap_err();
        assert!(matches!(err, PipelineError::TrackerNotConfigured));
    }
}
