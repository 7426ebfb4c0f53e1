//! Family network database operations.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{AccessLevel, FamilyMember, FamilyNetwork, Relationship};

impl Database {
    /// Get a user's network, or `None` if it was never created.
    pub fn get_network(&self, user_uid: &str) -> DbResult<Option<FamilyNetwork>> {
        let updated_at: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM family_networks WHERE user_uid = ?",
                [user_uid],
                |row| row.get(0),
            )
            .optional()?;

        let Some(updated_at) = updated_at else {
            return Ok(None);
        };

        Ok(Some(FamilyNetwork {
            user_uid: user_uid.to_string(),
            members: self.list_members(user_uid)?,
            updated_at: Some(updated_at),
        }))
    }

    /// Append a member, creating the network on first use.
    pub fn append_member(&self, network_uid: &str, member: &FamilyMember) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO family_networks (user_uid) VALUES (?1)
            ON CONFLICT(user_uid) DO UPDATE SET updated_at = datetime('now')
            "#,
            [network_uid],
        )?;

        self.conn.execute(
            r#"
            INSERT INTO family_members (
                network_uid, uid, email, name, relationship, status,
                access_level, is_emergency_contact, added_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                network_uid,
                member.uid,
                member.email,
                member.name,
                member.relationship.as_str(),
                member.status,
                member.access_level.as_str(),
                member.is_emergency_contact,
                member.added_at,
            ],
        )?;
        Ok(())
    }

    /// Set sharing options on every active member of `network_uid` with this email.
    ///
    /// Returns the number of member rows changed.
    pub fn update_member_access(
        &self,
        network_uid: &str,
        member_email: &str,
        access_level: AccessLevel,
        is_emergency_contact: bool,
    ) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE family_members SET access_level = ?3, is_emergency_contact = ?4
            WHERE network_uid = ?1 AND email = ?2 AND is_disabled = 0
            "#,
            params![
                network_uid,
                member_email,
                access_level.as_str(),
                is_emergency_contact,
            ],
        )?;

        if rows_affected > 0 {
            self.touch_network(network_uid)?;
        }
        Ok(rows_affected)
    }

    /// Disable every active member whose uid or email is `member_key`.
    ///
    /// Rows are kept; they just stop appearing in the network.
    /// Returns the number of members disabled.
    pub fn disable_member(
        &self,
        network_uid: &str,
        member_key: &str,
        disabled_at: &str,
    ) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE family_members SET is_disabled = 1, disabled_at = ?3
            WHERE network_uid = ?1 AND is_disabled = 0 AND (uid = ?2 OR email = ?2)
            "#,
            params![network_uid, member_key, disabled_at],
        )?;

        if rows_affected > 0 {
            self.touch_network(network_uid)?;
        }
        Ok(rows_affected)
    }

    /// Disable repeated active members of a network, keeping the earliest entry.
    ///
    /// Members are the same person when their uid matches, or, for entries
    /// without a uid, their email. Entries with neither are left alone.
    pub fn disable_duplicate_members(
        &self,
        network_uid: &str,
        disabled_at: &str,
    ) -> DbResult<usize> {
        let entries: Vec<(i64, Option<String>, Option<String>)> = {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT id, uid, email FROM family_members
                WHERE network_uid = ? AND is_disabled = 0
                ORDER BY id
                "#,
            )?;
            let rows = stmt.query_map([network_uid], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for (id, uid, email) in entries {
            let Some(key) = uid.or(email) else {
                continue;
            };
            if !seen.insert(key) {
                duplicates.push(id);
            }
        }

        for id in &duplicates {
            self.conn.execute(
                "UPDATE family_members SET is_disabled = 1, disabled_at = ?2 WHERE id = ?1",
                params![id, disabled_at],
            )?;
        }
        if !duplicates.is_empty() {
            self.touch_network(network_uid)?;
        }
        Ok(duplicates.len())
    }

    fn list_members(&self, network_uid: &str) -> DbResult<Vec<FamilyMember>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT uid, email, name, relationship, status,
                   access_level, is_emergency_contact, added_at
            FROM family_members
            WHERE network_uid = ? AND is_disabled = 0
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([network_uid], |row| {
            Ok(MemberRow {
                uid: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                relationship: row.get(3)?,
                status: row.get(4)?,
                access_level: row.get(5)?,
                is_emergency_contact: row.get(6)?,
                added_at: row.get(7)?,
            })
        })?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?.try_into()?);
        }
        Ok(members)
    }

    fn touch_network(&self, network_uid: &str) -> DbResult<()> {
        self.conn.execute(
            "UPDATE family_networks SET updated_at = datetime('now') WHERE user_uid = ?",
            [network_uid],
        )?;
        Ok(())
    }
}

/// Intermediate row struct for database mapping.
struct MemberRow {
    uid: Option<String>,
    email: Option<String>,
    name: String,
    relationship: String,
    status: String,
    access_level: String,
    is_emergency_contact: bool,
    added_at: String,
}

impl TryFrom<MemberRow> for FamilyMember {
    type Error = DbError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let access_level = AccessLevel::from_str(&row.access_level).ok_or_else(|| {
            DbError::Constraint(format!("Unknown access level: {}", row.access_level))
        })?;

        Ok(FamilyMember {
            uid: row.uid,
            email: row.email,
            name: row.name,
            relationship: Relationship::parse(&row.relationship),
            status: row.status,
            added_at: row.added_at,
            access_level,
            is_emergency_contact: row.is_emergency_contact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    /// Member rows in a network, disabled ones included.
    fn member_rows(db: &Database, network_uid: &str) -> i64 {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM family_members WHERE network_uid = ?",
                [network_uid],
                |row| row.get(0),
            )
            .unwrap()
    }

    fn member(uid: Option<&str>, email: Option<&str>, relationship: Relationship) -> FamilyMember {
        FamilyMember::accepted(
            uid.map(Into::into),
            email.map(Into::into),
            "Someone".into(),
            relationship,
        )
    }

    #[test]
    fn test_missing_network_is_none() {
        let db = setup_db();
        assert!(db.get_network("u1").unwrap().is_none());
    }

    #[test]
    fn test_append_creates_network_lazily() {
        let db = setup_db();
        db.append_member("u1", &member(Some("u2"), Some("bob@x.com"), Relationship::Child))
            .unwrap();
        db.append_member("u1", &member(Some("u3"), Some("carol@x.com"), Relationship::Spouse))
            .unwrap();

        let network = db.get_network("u1").unwrap().unwrap();
        assert_eq!(network.user_uid, "u1");
        assert_eq!(network.members.len(), 2);
        assert_eq!(network.members[0].relationship, Relationship::Child);
        assert_eq!(network.members[1].email.as_deref(), Some("carol@x.com"));
        assert!(network.updated_at.is_some());
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let db = setup_db();
        let m = member(Some("u2"), Some("bob@x.com"), Relationship::Friend);
        db.append_member("u1", &m).unwrap();
        db.append_member("u1", &m).unwrap();

        assert_eq!(db.get_network("u1").unwrap().unwrap().members.len(), 2);
    }

    #[test]
    fn test_update_member_access() {
        let db = setup_db();
        db.append_member("u1", &member(Some("u2"), Some("bob@x.com"), Relationship::Friend))
            .unwrap();

        let changed = db
            .update_member_access("u1", "bob@x.com", AccessLevel::Emergency, true)
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(
            db.update_member_access("u1", "nobody@x.com", AccessLevel::Full, false)
                .unwrap(),
            0
        );

        let network = db.get_network("u1").unwrap().unwrap();
        assert_eq!(network.members[0].access_level, AccessLevel::Emergency);
        assert!(network.members[0].is_emergency_contact);
    }

    #[test]
    fn test_disable_duplicate_members() {
        let db = setup_db();
        db.append_member("u1", &member(Some("u2"), Some("bob@x.com"), Relationship::Friend))
            .unwrap();
        db.append_member("u1", &member(Some("u2"), Some("bob@x.com"), Relationship::Cousin))
            .unwrap();
        db.append_member("u1", &member(None, Some("gran@x.com"), Relationship::Grandparent))
            .unwrap();
        db.append_member("u1", &member(None, Some("gran@x.com"), Relationship::Grandparent))
            .unwrap();
        db.append_member("u1", &member(None, None, Relationship::Friend))
            .unwrap();
        db.append_member("u1", &member(None, None, Relationship::Friend))
            .unwrap();

        assert_eq!(db.disable_duplicate_members("u1", "now").unwrap(), 2);

        let network = db.get_network("u1").unwrap().unwrap();
        assert_eq!(network.members.len(), 4);
        // Earliest entry wins
        assert_eq!(network.members[0].relationship, Relationship::Friend);
        // Nothing is deleted
        assert_eq!(member_rows(&db, "u1"), 6);
        assert_eq!(db.disable_duplicate_members("u1", "now").unwrap(), 0);
    }

    #[test]
    fn test_disable_member_by_uid_or_email() {
        let db = setup_db();
        db.append_member("u1", &member(Some("u2"), Some("bob@x.com"), Relationship::Friend))
            .unwrap();
        db.append_member("u1", &member(None, Some("gran@x.com"), Relationship::Grandparent))
            .unwrap();

        assert_eq!(db.disable_member("u1", "u2", "now").unwrap(), 1);
        assert_eq!(db.disable_member("u1", "gran@x.com", "now").unwrap(), 1);
        assert_eq!(db.disable_member("u1", "u2", "now").unwrap(), 0);

        let network = db.get_network("u1").unwrap().unwrap();
        assert!(network.members.is_empty());
        assert_eq!(member_rows(&db, "u1"), 2);

        // Disabled members no longer take access updates
        assert_eq!(
            db.update_member_access("u1", "bob@x.com", AccessLevel::Full, true)
                .unwrap(),
            0
        );
    }
}
