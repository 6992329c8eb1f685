//! Database layer for the clinic engine.

mod appointments;
mod medicines;
mod outcomes;
mod records;
mod replenishment;
mod schema;
mod snapshot;

pub use schema::*;
pub use snapshot::*;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// True when SQLite rejected a write because of a UNIQUE/CHECK constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == ErrorCode::ConstraintViolation
            }
            DbError::Constraint(_) => true,
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a single transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write made by `f`.
    /// Calls must not nest.
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = self.conn.unchecked_transaction().map_err(DbError::from)?;
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Medicine;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"appointments".to_string()));
        assert!(tables.contains(&"appointment_outcomes".to_string()));
        assert!(tables.contains(&"prescriptions".to_string()));
        assert!(tables.contains(&"medicines".to_string()));
        assert!(tables.contains(&"replenishment_requests".to_string()));
        assert!(tables.contains(&"medical_records".to_string()));
    }

    #[test]
    fn test_atomically_commits() {
        let db = Database::open_in_memory().unwrap();
        db.atomically(|db| {
            db.insert_medicine(&Medicine::new("Paracetamol".into(), 0.5, 10, 5))
        })
        .unwrap();

        assert!(db.get_medicine("Paracetamol").unwrap().is_some());
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: DbResult<()> = db.atomically(|db| {
            db.insert_medicine(&Medicine::new("Paracetamol".into(), 0.5, 10, 5))?;
            Err(DbError::Constraint("abort".into()))
        });

        assert!(result.is_err());
        assert!(db.get_medicine("Paracetamol").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_medicine_is_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        let med = Medicine::new("Paracetamol".into(), 0.5, 10, 5);
        db.insert_medicine(&med).unwrap();

        let err = db.insert_medicine(&med).unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
