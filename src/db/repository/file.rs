use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

pub fn insert_file(conn: &Connection, file: &StoredFile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO files (id, filename, extracted_data, input_data, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            file.id.to_string(),
            file.filename,
            file.extracted_data,
            file.input_data,
            file.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_files(conn: &Connection) -> Result<Vec<FileSummary>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, filename, status FROM files ORDER BY filename")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut files = Vec::new();
    for row in rows {
        let (id, filename, status) = row?;
        files.push(FileSummary {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            filename,
            status: FileStatus::from_str(&status)?,
        });
    }
    Ok(files)
}

/// Concatenated requirement-document text for a file, `None` when the file
/// does not exist or holds no extracted text.
pub fn get_file_data(conn: &Connection, file_id: &Uuid) -> Result<Option<String>, DatabaseError> {
    match conn.query_row(
        "SELECT extracted_data FROM files WHERE id = ?1",
        params![file_id.to_string()],
        |row| row.get::<_, String>(0),
    ) {
        Ok(data) if data.is_empty() => Ok(None),
        Ok(data) => Ok(Some(data)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Concatenated input-example text for a file. Unlike extracted text, an
/// empty string is a legal value (uploads without input files).
pub fn get_input_data(conn: &Connection, file_id: &Uuid) -> Result<Option<String>, DatabaseError> {
    match conn.query_row(
        "SELECT input_data FROM files WHERE id = ?1",
        params![file_id.to_string()],
        |row| row.get::<_, String>(0),
    ) {
        Ok(data) => Ok(Some(data)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_file_status(
    conn: &Connection,
    file_id: &Uuid,
    status: FileStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE files SET status = ?1 WHERE id = ?2",
        params![status.as_str(), file_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound(format!("file {file_id}")));
    }
    Ok(())
}
