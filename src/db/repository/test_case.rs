use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

pub fn insert_test_case(conn: &Connection, tc: &TestCase) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO test_cases (id, file_id, req_id, req_title_id, req_title, req_description,
         tc_id, tc_title, tc_description, expected_result, input_data, compliance_tags, risk,
         created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            tc.id.to_string(),
            tc.file_id.to_string(),
            tc.req_id.to_string(),
            tc.req_title_id,
            tc.req_title,
            tc.req_description,
            tc.tc_id,
            tc.tc_title,
            tc.tc_description,
            tc.expected_result,
            tc.input_data,
            tc.compliance_tags,
            tc.risk.as_str(),
            tc.created_at.to_string(),
        ],
    )?;
    Ok(())
}

/// Batch insert inside one transaction; either all rows land or none do.
pub fn save_test_cases(conn: &Connection, cases: &[TestCase]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for tc in cases {
        insert_test_case(&tx, tc)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_all_test_cases(conn: &Connection) -> Result<Vec<TestCase>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, req_id, req_title_id, req_title, req_description,
         tc_id, tc_title, tc_description, expected_result, input_data, compliance_tags, risk,
         created_at
         FROM test_cases ORDER BY req_title_id, tc_id",
    )?;

    let rows = stmt.query_map([], map_test_case_row)?;
    test_case_rows_to_vec(rows)
}

/// Stored description for one test case, addressed the way clients see it:
/// by owning requirement plus the per-requirement `tc_id` label.
pub fn get_test_case_description(
    conn: &Connection,
    req_id: &Uuid,
    tc_id: &str,
) -> Result<Option<String>, DatabaseError> {
    match conn.query_row(
        "SELECT tc_description FROM test_cases WHERE req_id = ?1 AND tc_id = ?2",
        params![req_id.to_string(), tc_id],
        |row| row.get::<_, String>(0),
    ) {
        Ok(description) => Ok(Some(description)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_test_case_description(
    conn: &Connection,
    req_id: &Uuid,
    tc_id: &str,
    description: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE test_cases SET tc_description = ?1 WHERE req_id = ?2 AND tc_id = ?3",
        params![description, req_id.to_string(), tc_id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound(format!(
            "test case {tc_id} of requirement {req_id}"
        )));
    }
    Ok(())
}

type TestCaseRow = (
    String, String, String, String, String, String,
    String, String, String, String, String, String, String,
    String,
);

fn map_test_case_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestCaseRow> {
    Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, String>(5)?,
        row.get::<_, String>(6)?,
        row.get::<_, String>(7)?,
        row.get::<_, String>(8)?,
        row.get::<_, String>(9)?,
        row.get::<_, String>(10)?,
        row.get::<_, String>(11)?,
        row.get::<_, String>(12)?,
        row.get::<_, String>(13)?,
    ))
}

fn test_case_rows_to_vec(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<TestCaseRow>>,
) -> Result<Vec<TestCase>, DatabaseError> {
    let mut cases = Vec::new();
    for row in rows {
        let (
            id, file_id, req_id, req_title_id, req_title, req_description,
            tc_id, tc_title, tc_description, expected_result, input_data, compliance_tags, risk,
            created_at,
        ) = row?;
        cases.push(TestCase {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            file_id: Uuid::parse_str(&file_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            req_id: Uuid::parse_str(&req_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            req_title_id,
            req_title,
            req_description,
            tc_id,
            tc_title,
            tc_description,
            expected_result,
            input_data,
            compliance_tags,
            risk: RiskLevel::parse_loose(&risk),
            created_at: NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S%.f")
                .unwrap_or_default(),
        });
    }
    Ok(cases)
}
