//! Family request database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{FamilyRequest, Relationship, RequestStatus};

const REQUEST_COLUMNS: &str = r#"
    id, from_uid, from_email, to_uid, to_email, to_name,
    relationship, status, created_at, responded_at, updated_at
"#;

impl Database {
    /// Insert a new family request.
    pub fn insert_request(&self, request: &FamilyRequest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO family_requests (
                id, from_uid, from_email, to_uid, to_email, to_name,
                relationship, status, created_at, responded_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                request.id,
                request.from_uid,
                request.from_email,
                request.to_uid,
                request.to_email,
                request.to_name,
                request.relationship.as_str(),
                request.status.as_str(),
                request.created_at,
                request.responded_at,
                request.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a request by ID.
    pub fn get_request(&self, id: &str) -> DbResult<Option<FamilyRequest>> {
        let sql = format!("SELECT {} FROM family_requests WHERE id = ?", REQUEST_COLUMNS);
        self.conn
            .query_row(&sql, [id], RequestRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Every request sent from an email, any status.
    pub fn list_requests_from(&self, from_email: &str) -> DbResult<Vec<FamilyRequest>> {
        self.query_requests(
            "WHERE from_email = ? ORDER BY created_at DESC",
            &[from_email],
        )
    }

    /// Pending requests sent from an email.
    pub fn list_pending_requests_from(&self, from_email: &str) -> DbResult<Vec<FamilyRequest>> {
        self.query_requests(
            "WHERE from_email = ? AND status = 'pending' ORDER BY created_at DESC",
            &[from_email],
        )
    }

    /// Pending requests addressed to an email.
    pub fn list_pending_requests_to(&self, to_email: &str) -> DbResult<Vec<FamilyRequest>> {
        self.query_requests(
            "WHERE to_email = ? AND status = 'pending' ORDER BY created_at DESC",
            &[to_email],
        )
    }

    /// Overwrite a request's relationship label. Returns false if no such request.
    pub fn update_request_relationship(
        &self,
        id: &str,
        relationship: &Relationship,
        updated_at: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE family_requests SET relationship = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, relationship.as_str(), updated_at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Move a pending request to a terminal status.
    ///
    /// The update only applies while the row is still pending, so a request
    /// resolved by someone else in the meantime fails with
    /// [`DbError::PreconditionFailed`].
    pub fn resolve_request(
        &self,
        id: &str,
        status: RequestStatus,
        responded_at: &str,
    ) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE family_requests SET status = ?2, responded_at = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
            params![id, status.as_str(), responded_at],
        )?;

        if rows_affected == 0 {
            return Err(DbError::PreconditionFailed(format!(
                "Request {} is no longer pending",
                id
            )));
        }
        Ok(())
    }

    fn query_requests(&self, clause: &str, args: &[&str]) -> DbResult<Vec<FamilyRequest>> {
        let sql = format!("SELECT {} FROM family_requests {}", REQUEST_COLUMNS, clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), RequestRow::from_row)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?.try_into()?);
        }
        Ok(requests)
    }
}

/// Intermediate row struct for database mapping.
struct RequestRow {
    id: String,
    from_uid: String,
    from_email: String,
    to_uid: Option<String>,
    to_email: Option<String>,
    to_name: Option<String>,
    relationship: String,
    status: String,
    created_at: String,
    responded_at: Option<String>,
    updated_at: Option<String>,
}

impl RequestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            from_uid: row.get(1)?,
            from_email: row.get(2)?,
            to_uid: row.get(3)?,
            to_email: row.get(4)?,
            to_name: row.get(5)?,
            relationship: row.get(6)?,
            status: row.get(7)?,
            created_at: row.get(8)?,
            responded_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl TryFrom<RequestRow> for FamilyRequest {
    type Error = DbError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = RequestStatus::from_str(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown request status: {}", row.status)))?;

        Ok(FamilyRequest {
            id: row.id,
            from_uid: row.from_uid,
            from_email: row.from_email,
            to_uid: row.to_uid,
            to_email: row.to_email,
            to_name: row.to_name,
            relationship: Relationship::parse(&row.relationship),
            status,
            created_at: row.created_at,
            responded_at: row.responded_at,
            updated_at: row.updated_at,
        })
    }
}
