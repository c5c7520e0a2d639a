//! Promotion of raw model output into validated draft values.
//!
//! Model responses are treated as untyped JSON documents: every field goes
//! through an explicit checklist before it reaches a typed draft, and
//! anything failing the checklist takes the fallback or drop path.

use std::str::FromStr;

use serde_json::Value;
use tracing::warn;

use super::types::{RequirementDraft, TestCaseDraft};
use super::AiError;
use crate::models::enums::{ComplianceTag, RiskLevel};

/// Candidate fields probed for a test case's representative input string,
/// in lookup order.
const INPUT_EXAMPLE_KEYS: &[&str] = &[
    "input_data",
    "input",
    "example_input",
    "example",
    "sample_input",
];

/// Fixed requirement emitted when the model's answer is unusable.
pub fn fallback_requirement() -> RequirementDraft {
    RequirementDraft {
        title: "Healthcare System Requirement".into(),
        description: "General healthcare system functionality requirement extracted from the provided document.".into(),
        req_type: "Functional".into(),
        source: "Fallback".into(),
        category: "General".into(),
        priority: "Medium".into(),
    }
}

/// Parse the single-object answer of a contextual extraction call. The
/// object must expose at least `type`, `title` and `description`; any other
/// shape yields the fallback requirement.
pub fn requirement_from_context_response(raw: &str) -> RequirementDraft {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "contextual extraction returned unparseable JSON");
            return fallback_requirement();
        }
    };

    let has_required = value.is_object()
        && ["type", "title", "description"]
            .iter()
            .all(|k| value.get(k).is_some());
    if !has_required {
        warn!("contextual extraction returned an unexpected shape");
        return fallback_requirement();
    }

    draft_from_value(&value, "AI Generated with Context")
}

/// Parse the `{"requirements": [...]}` answer of a whole-document extraction
/// call. Malformed JSON is a hard error (the caller substitutes its
/// fallback); a missing or empty array is a legal zero-result answer.
pub fn requirements_from_document_response(raw: &str) -> Result<Vec<RequirementDraft>, AiError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AiError::ResponseParsing(e.to_string()))?;

    let Some(items) = value.get("requirements").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| draft_from_value(item, "AI Extracted"))
        .collect())
}

/// Parse and clean the `{"test_cases": [...]}` answer of a generation call.
/// Malformed JSON is a hard error (the unit of work fails); a missing or
/// empty array is a legal zero-result answer.
pub fn test_cases_from_response(raw: &str) -> Result<Vec<TestCaseDraft>, AiError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AiError::ResponseParsing(e.to_string()))?;

    let Some(items) = value.get("test_cases").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(clean_test_cases(items))
}

/// Drop candidates missing the identifying trio, restrict compliance to the
/// recognized tag set and canonicalize risk.
fn clean_test_cases(items: &[Value]) -> Vec<TestCaseDraft> {
    let mut cleaned = Vec::new();

    for item in items {
        if !item.is_object() {
            continue;
        }

        let test_id = str_field(item, "test_id").trim().to_string();
        let title = str_field(item, "title").trim().to_string();
        let description = str_field(item, "description").trim().to_string();

        if test_id.is_empty() || title.is_empty() || description.is_empty() {
            continue;
        }

        let compliance = item
            .get("compliance")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .filter_map(|s| ComplianceTag::from_str(s).ok())
                    .collect()
            })
            .unwrap_or_default();

        cleaned.push(TestCaseDraft {
            test_id,
            title,
            description,
            input_data: item
                .get("input_data")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            input_example: input_example_from(item),
            expected_result: str_field(item, "expected_result").to_string(),
            compliance,
            risk: RiskLevel::parse_loose(str_field(item, "risk")),
        });
    }

    cleaned
}

/// First usable value among the candidate input fields: a non-blank string
/// (trimmed) or an object (JSON-serialized). Empty when none match.
pub fn input_example_from(item: &Value) -> String {
    for key in INPUT_EXAMPLE_KEYS {
        match item.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
            Some(value @ Value::Object(_)) => {
                return serde_json::to_string(value).unwrap_or_default()
            }
            _ => {}
        }
    }
    String::new()
}

/// Trimmed-plain-text answer of an improvement call; blank answers keep the
/// original description.
pub fn improved_description(raw: &str, original: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        original.to_string()
    } else {
        trimmed.to_string()
    }
}

fn draft_from_value(value: &Value, default_source: &str) -> RequirementDraft {
    RequirementDraft {
        title: str_or(value, "title", "Untitled Requirement"),
        description: str_or(value, "description", "No description provided"),
        req_type: str_or(value, "type", "Functional"),
        source: str_or(value, "source", default_source),
        category: str_or(value, "category", ""),
        priority: str_or(value, "priority", "Medium"),
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
