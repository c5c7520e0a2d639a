//! Connection setup and schema migrations.

use crate::db::DatabaseError;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// Open (or create) the database at `path` and bring the schema up to date.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DatabaseError::MigrationFailed {
            version: 0,
            message: format!("cannot create database directory: {e}"),
        })?;
    }

    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;

    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// In-memory database with the full schema applied. Test-only convenience,
/// but kept in the non-test tree so integration tests can share it.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.pragma_update(None, "journal_mode", "DELETE")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/migrations/001_initial.sql"),
    )];

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;

    let current: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    for (version, sql) in migrations {
        if version > current {
            conn.execute_batch(sql)
                .map_err(|e| DatabaseError::MigrationFailed {
                    version,
                    message: e.to_string(),
                })?;
            debug!(version, "applied migration");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_tables(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn memory_database_has_schema() {
        let conn = open_memory_database().unwrap();
        // schema_version + files + requirements + test_cases
        assert_eq!(count_tables(&conn), 4);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = open_memory_database().unwrap();
        run_migrations(&conn).unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = open_memory_database().unwrap();
        let result = conn.execute(
            "INSERT INTO requirements (requirement_id, file_id, req_title_id, title, description,
                                       type, source, category, priority, created_at)
             VALUES ('r1', 'missing-file', 'REQ-001', 't', 'd', 'Functional', 's', '', 'Medium',
                     '2026-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn open_database_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.db");
        let conn = open_database(&path).unwrap();
        assert_eq!(count_tables(&conn), 4);
        assert!(path.exists());
    }
}
