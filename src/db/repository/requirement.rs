use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_requirement(conn: &Connection, req: &Requirement) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO requirements (requirement_id, file_id, req_title_id, title, description,
         type, source, category, priority, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            req.requirement_id.to_string(),
            req.file_id.to_string(),
            req.req_title_id,
            req.title,
            req.description,
            req.req_type,
            req.source,
            req.category,
            req.priority,
            req.created_at.to_string(),
        ],
    )?;
    Ok(())
}

/// Batch insert inside one transaction; either all rows land or none do.
pub fn save_requirements(conn: &Connection, reqs: &[Requirement]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for req in reqs {
        insert_requirement(&tx, req)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_requirement(
    conn: &Connection,
    requirement_id: &Uuid,
) -> Result<Option<Requirement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT requirement_id, file_id, req_title_id, title, description,
         type, source, category, priority, created_at
         FROM requirements WHERE requirement_id = ?1",
    )?;

    let rows = stmt.query_map(params![requirement_id.to_string()], map_requirement_row)?;
    Ok(requirement_rows_to_vec(rows)?.into_iter().next())
}

pub fn get_all_requirements(conn: &Connection) -> Result<Vec<Requirement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT requirement_id, file_id, req_title_id, title, description,
         type, source, category, priority, created_at
         FROM requirements ORDER BY file_id, req_title_id",
    )?;

    let rows = stmt.query_map([], map_requirement_row)?;
    requirement_rows_to_vec(rows)
}

pub fn get_requirements_by_file(
    conn: &Connection,
    file_id: &Uuid,
) -> Result<Vec<Requirement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT requirement_id, file_id, req_title_id, title, description,
         type, source, category, priority, created_at
         FROM requirements WHERE file_id = ?1 ORDER BY req_title_id",
    )?;

    let rows = stmt.query_map(params![file_id.to_string()], map_requirement_row)?;
    requirement_rows_to_vec(rows)
}

type RequirementRow = (
    String, String, String, String, String,
    String, String, String, String, String,
);

fn map_requirement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RequirementRow> {
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
    ))
}

fn requirement_rows_to_vec(
    rows: rusqlite::MappedRows<
        '_,
        impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<RequirementRow>,
    >,
) -> Result<Vec<Requirement>, DatabaseError> {
    let mut reqs = Vec::new();
    for row in rows {
        let (
            requirement_id, file_id, req_title_id, title, description,
            req_type, source, category, priority, created_at,
        ) = row?;
        reqs.push(Requirement {
            requirement_id: Uuid::parse_str(&requirement_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            file_id: Uuid::parse_str(&file_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            req_title_id,
            title,
            description,
            req_type,
            source,
            category,
            priority,
            created_at: NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S%.f")
                .unwrap_or_default(),
        });
    }
    Ok(reqs)
}
