//! SQLite persistence: connection management, migrations and repositories.

pub mod repository;
pub mod sqlite;

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid {field} value in database: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Migration {version} failed: {message}")]
    MigrationFailed { version: i64, message: String },

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Locks the shared connection, surfacing a poisoned mutex as a database
/// error instead of a panic.
pub fn lock_db(db: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
    db.lock().map_err(|_| DatabaseError::LockPoisoned)
}
