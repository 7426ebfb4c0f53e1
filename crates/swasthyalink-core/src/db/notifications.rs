//! Notification database operations.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::{Notification, NotificationKind};

impl Database {
    /// Insert a notification.
    pub fn insert_notification(&self, notification: &Notification) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO notifications (
                id, recipient_id, kind, message, related_id, read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                notification.id,
                notification.recipient_id,
                notification.kind.as_str(),
                notification.message,
                notification.related_id,
                notification.read,
                notification.created_at,
            ],
        )?;
        Ok(())
    }

    /// Active notifications for a recipient, newest first.
    pub fn list_notifications(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> DbResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, recipient_id, kind, message, related_id, read, created_at
            FROM notifications
            WHERE recipient_id = ? AND is_disabled = 0
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![recipient_id, limit as i64], |row| {
            Ok(NotificationRow {
                id: row.get(0)?,
                recipient_id: row.get(1)?,
                kind: row.get(2)?,
                message: row.get(3)?,
                related_id: row.get(4)?,
                read: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?.try_into()?);
        }
        Ok(notifications)
    }

    /// Mark a notification as read. Returns false if it does not exist.
    pub fn mark_notification_read(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("UPDATE notifications SET read = 1 WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Mark every unread active notification for a recipient as read.
    ///
    /// Returns how many changed.
    pub fn mark_all_notifications_read(&self, recipient_id: &str) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE notifications SET read = 1
            WHERE recipient_id = ? AND read = 0 AND is_disabled = 0
            "#,
            [recipient_id],
        )?;
        Ok(rows_affected)
    }

    /// Hide a notification from listings. The row is kept.
    ///
    /// Returns false if it does not exist.
    pub fn disable_notification(&self, id: &str, disabled_at: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE notifications SET is_disabled = 1, disabled_at = COALESCE(disabled_at, ?2)
            WHERE id = ?1
            "#,
            params![id, disabled_at],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct NotificationRow {
    id: String,
    recipient_id: String,
    kind: String,
    message: String,
    related_id: Option<String>,
    read: bool,
    created_at: String,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DbError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind = NotificationKind::from_str(&row.kind)
            .ok_or_else(|| DbError::Constraint(format!("Unknown notification kind: {}", row.kind)))?;

        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            kind,
            message: row.message,
            related_id: row.related_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}
