//! SQLite schema definition.

/// Complete database schema for the family network.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- User Directory
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    uid TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Family Requests (pending -> accepted | rejected)
-- ============================================================================

CREATE TABLE IF NOT EXISTS family_requests (
    id TEXT PRIMARY KEY,
    from_uid TEXT NOT NULL,
    from_email TEXT NOT NULL,
    to_uid TEXT,
    to_email TEXT,
    to_name TEXT,
    relationship TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'accepted', 'rejected')),
    created_at TEXT NOT NULL,
    responded_at TEXT,
    updated_at TEXT,
    CHECK (to_email IS NOT NULL OR to_name IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_requests_from_status ON family_requests(from_email, status);
CREATE INDEX IF NOT EXISTS idx_requests_to_status ON family_requests(to_email, status);

-- Once a request leaves 'pending' its status is frozen
CREATE TRIGGER IF NOT EXISTS family_requests_status_terminal BEFORE UPDATE OF status ON family_requests
WHEN old.status != 'pending' AND new.status != old.status
BEGIN
    SELECT RAISE(ABORT, 'Request status is terminal');
END;

-- ============================================================================
-- Family Networks (created lazily on first acceptance)
-- ============================================================================

CREATE TABLE IF NOT EXISTS family_networks (
    user_uid TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Members are appended, never deduplicated on insert. Removal sets
-- is_disabled and keeps the row.
CREATE TABLE IF NOT EXISTS family_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    network_uid TEXT NOT NULL REFERENCES family_networks(user_uid),
    uid TEXT,
    email TEXT,
    name TEXT NOT NULL,
    relationship TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'accepted' CHECK (status = 'accepted'),
    access_level TEXT NOT NULL DEFAULT 'limited'
        CHECK (access_level IN ('limited', 'full', 'emergency')),
    is_emergency_contact INTEGER NOT NULL DEFAULT 0,
    added_at TEXT NOT NULL,
    is_disabled INTEGER NOT NULL DEFAULT 0,
    disabled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_members_network ON family_members(network_uid);
CREATE INDEX IF NOT EXISTS idx_members_email ON family_members(network_uid, email);

-- ============================================================================
-- Notifications
-- ============================================================================

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    related_id TEXT,
    read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    is_disabled INTEGER NOT NULL DEFAULT 0,
    disabled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, created_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_request_needs_target() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO family_requests (id, from_uid, from_email, relationship, created_at)
             VALUES ('r1', 'u1', 'a@x.com', 'Friend', 'now')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO family_requests (id, from_uid, from_email, to_name, relationship, created_at)
             VALUES ('r1', 'u1', 'a@x.com', 'Bob', 'Friend', 'now')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_terminal_status_trigger() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO family_requests (id, from_uid, from_email, to_email, relationship, created_at)
             VALUES ('r1', 'u1', 'a@x.com', 'b@x.com', 'Friend', 'now')",
            [],
        )
        .unwrap();

        // pending -> accepted is allowed
        let result = conn.execute(
            "UPDATE family_requests SET status = 'accepted' WHERE id = 'r1'",
            [],
        );
        assert!(result.is_ok());

        // accepted -> rejected is not
        let result = conn.execute(
            "UPDATE family_requests SET status = 'rejected' WHERE id = 'r1'",
            [],
        );
        assert!(result.is_err());

        // Relabelling a resolved request is still allowed
        let result = conn.execute(
            "UPDATE family_requests SET relationship = 'Cousin' WHERE id = 'r1'",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_member_status_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute("INSERT INTO family_networks (user_uid) VALUES ('u1')", [])
            .unwrap();

        let result = conn.execute(
            "INSERT INTO family_members (network_uid, name, relationship, status, added_at)
             VALUES ('u1', 'Bob', 'Friend', 'pending', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
