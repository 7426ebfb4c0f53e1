//! User directory database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::UserProfile;

impl Database {
    /// Insert or replace a directory entry.
    pub fn upsert_user(&self, user: &UserProfile) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (uid, email, name) VALUES (?1, ?2, ?3)
            ON CONFLICT(uid) DO UPDATE SET email = excluded.email, name = excluded.name
            "#,
            params![user.uid, user.email, user.name],
        )?;
        Ok(())
    }

    /// Find a user by email.
    pub fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserProfile>> {
        self.conn
            .query_row(
                "SELECT uid, email, name FROM users WHERE email = ?",
                [email],
                |row| {
                    Ok(UserProfile {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}
