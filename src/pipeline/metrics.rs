//! Compliance metrics aggregated over every stored test case.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{repository, DatabaseError};
use crate::models::RiskLevel;

#[derive(Debug, Serialize)]
pub struct ComplianceMetrics {
    pub file_id: String,
    pub total_test_cases: usize,
    pub compliance_tags: Vec<String>,
    pub compliance_counts: BTreeMap<String, usize>,
    pub risk_counts: RiskCounts,
    pub last_updated: Option<NaiveDateTime>,
    pub test_cases: Vec<MetricsCase>,
}

#[derive(Debug, Default, Serialize)]
pub struct RiskCounts {
    #[serde(rename = "Critical")]
    pub critical: usize,
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "Low")]
    pub low: usize,
}

#[derive(Debug, Serialize)]
pub struct MetricsCase {
    pub compliance_tags: Vec<String>,
    pub risk: RiskLevel,
    pub created_at: NaiveDateTime,
}

/// Aggregate tag and risk counts over the whole table. Pure read; running
/// it twice yields identical numbers.
pub fn compliance_metrics(conn: &Connection) -> Result<ComplianceMetrics, DatabaseError> {
    let cases = repository::get_all_test_cases(conn)?;

    let mut compliance_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut all_tags: BTreeSet<String> = BTreeSet::new();
    let mut risk_counts = RiskCounts::default();
    let mut last_updated: Option<NaiveDateTime> = None;
    let mut details = Vec::with_capacity(cases.len());

    for case in &cases {
        let tags = split_tags(&case.compliance_tags);
        for tag in &tags {
            *compliance_counts.entry(tag.clone()).or_insert(0) += 1;
            all_tags.insert(tag.clone());
        }

        match case.risk {
            RiskLevel::Critical => risk_counts.critical += 1,
            RiskLevel::High => risk_counts.high += 1,
            RiskLevel::Medium => risk_counts.medium += 1,
            RiskLevel::Low => risk_counts.low += 1,
        }

        last_updated = match last_updated {
            Some(prev) if prev >= case.created_at => Some(prev),
            _ => Some(case.created_at),
        };

        details.push(MetricsCase {
            compliance_tags: tags,
            risk: case.risk,
            created_at: case.created_at,
        });
    }

    Ok(ComplianceMetrics {
        file_id: "all".to_string(),
        total_test_cases: cases.len(),
        compliance_tags: all_tags.into_iter().collect(),
        compliance_counts,
        risk_counts,
        last_updated,
        test_cases: details,
    })
}

/// Tags are stored comma-joined; older rows joined groups with `|`. Both
/// separators split.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split('|')
        .flat_map(|part| part.split(','))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
