//! Database layer for the family network.

mod schema;
mod batch;
mod networks;
mod notifications;
mod requests;
mod users;

pub use schema::*;
pub use batch::*;
#[allow(unused_imports)]
pub use networks::*;
#[allow(unused_imports)]
pub use notifications::*;
#[allow(unused_imports)]
pub use requests::*;
#[allow(unused_imports)]
pub use users::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A guarded write found the row in an unexpected state.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        info!(path = %path.as_ref().display(), "Opening SQLite database");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        debug!("Opening in-memory SQLite database");
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

    /// Run `f` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. The write lock is
    /// taken up front so read-check-write sequences in `f` cannot interleave
    /// with another writer. Must not be nested.
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        // Dropping `tx` on the error path rolls back.
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"family_requests".to_string()));
        assert!(tables.contains(&"family_networks".to_string()));
        assert!(tables.contains(&"family_members".to_string()));
        assert!(tables.contains(&"notifications".to_string()));
    }

    #[test]
    fn test_open_on_disk_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("family.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute("INSERT INTO family_networks (user_uid) VALUES ('u1')", [])
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM family_networks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: DbResult<()> = db.atomically(|db| {
            db.conn()
                .execute("INSERT INTO family_networks (user_uid) VALUES ('u1')", [])?;
            Err(DbError::Constraint("abort".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM family_networks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_atomically_commits_on_success() {
        let db = Database::open_in_memory().unwrap();

        let inserted: DbResult<usize> = db.atomically(|db| {
            Ok(db
                .conn()
                .execute("INSERT INTO family_networks (user_uid) VALUES ('u1')", [])?)
        });
        assert_eq!(inserted.unwrap(), 1);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM family_networks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
