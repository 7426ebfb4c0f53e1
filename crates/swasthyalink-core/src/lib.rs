//! Swasthyalink Core Library
//!
//! Family network relationship graph for the Swasthyalink care platform.
//!
//! # Architecture
//!
//! ```text
//!   requester ──CreateRequest──▶ [family_requests: pending]
//!                                          │
//!                           ┌──────────────┴──────────────┐
//!                           ▼                             ▼
//!                     AcceptRequest                 RejectRequest
//!                           │                             │
//!            ┌──────── WriteBatch (one tx) ────────┐      │
//!            │ target network   += requester       │      │
//!            │ requester network += target (inv.)  │      ▼
//!            │ request.status    = accepted        │   status = rejected
//!            └─────────────────────────────────────┘
//!                           │
//!                    NotificationSink (fire-and-forget)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite storage and atomic write batches
//! - [`models`]: Domain types (FamilyRequest, FamilyMember, Relationship, etc.)
//! - [`family`]: Request workflow, name resolution, notifications
//! - [`api`]: JSON success/error envelopes for transport layers
//! - [`config`]: TOML configuration

pub mod api;
pub mod config;
pub mod db;
pub mod family;
pub mod models;

// Re-export commonly used types
pub use api::{ApiResponse, FamilyApi};
pub use config::Config;
pub use db::{Database, WriteBatch};
pub use family::{FamilyError, FamilyGraph, FamilyResult, NameResolver, NotificationSink};
pub use models::{
    AccessLevel, FamilyMember, FamilyNetwork, FamilyRequest, NewFamilyRequest, Notification,
    NotificationKind, Relationship, RequestLists, RequestStatus, UserProfile,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use family::{ChainedResolver, NoopSink, StaticDirectory};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SwasthyalinkError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for SwasthyalinkError {
    fn from(e: db::DbError) -> Self {
        SwasthyalinkError::DatabaseError(e.to_string())
    }
}

impl From<FamilyError> for SwasthyalinkError {
    fn from(e: FamilyError) -> Self {
        match e {
            FamilyError::Validation(field) => {
                SwasthyalinkError::InvalidInput(format!("Missing required field: {}", field))
            }
            FamilyError::InvalidBody(msg) => SwasthyalinkError::InvalidInput(msg),
            FamilyError::Conflict(msg) => SwasthyalinkError::Conflict(msg),
            FamilyError::NotFound(msg) => SwasthyalinkError::NotFound(msg),
            FamilyError::InvalidState(msg) => SwasthyalinkError::InvalidState(msg),
            FamilyError::Dependency(e) => SwasthyalinkError::DatabaseError(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for SwasthyalinkError {
    fn from(e: config::ConfigError) -> Self {
        SwasthyalinkError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SwasthyalinkError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SwasthyalinkError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<SwasthyalinkCore>, SwasthyalinkError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(SwasthyalinkCore::with_config(db, &Config::default())))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<SwasthyalinkCore>, SwasthyalinkError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(SwasthyalinkCore::with_config(db, &Config::default())))
}

/// Open the database named by a TOML configuration document.
#[uniffi::export]
pub fn open_with_config(config_toml: String) -> Result<Arc<SwasthyalinkCore>, SwasthyalinkError> {
    let config = Config::from_toml_str(&config_toml)?;
    let db = Database::open(&config.database_path)?;
    Ok(Arc::new(SwasthyalinkCore::with_config(db, &config)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct SwasthyalinkCore {
    db: Arc<Mutex<Database>>,
    directory: StaticDirectory,
    notifications_enabled: bool,
}

impl SwasthyalinkCore {
    fn with_config(db: Database, config: &Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            directory: config.static_directory(),
            notifications_enabled: config.notifications_enabled,
        }
    }

    /// Run `f` against a graph that resolves names from the user table, then
    /// the configured directory.
    fn with_graph<T>(
        &self,
        f: impl FnOnce(&FamilyGraph<'_>) -> FamilyResult<T>,
    ) -> Result<T, SwasthyalinkError> {
        let db = self.db.lock()?;
        let names = ChainedResolver::new(vec![&*db as &dyn NameResolver, &self.directory]);
        let notifier: &dyn NotificationSink = if self.notifications_enabled {
            &*db
        } else {
            &NoopSink
        };
        let graph = FamilyGraph::new(&db)
            .with_names(&names)
            .with_notifier(notifier);
        Ok(f(&graph)?)
    }
}

#[uniffi::export]
impl SwasthyalinkCore {
    // =========================================================================
    // User Directory
    // =========================================================================

    /// Add or update an account in the user directory.
    pub fn register_user(
        &self,
        uid: String,
        email: String,
        name: String,
    ) -> Result<(), SwasthyalinkError> {
        let db = self.db.lock()?;
        db.upsert_user(&UserProfile::new(uid, email, name))?;
        Ok(())
    }

    // =========================================================================
    // Request Operations
    // =========================================================================

    /// Send a family request.
    pub fn send_request(
        &self,
        request: FfiNewFamilyRequest,
    ) -> Result<FfiFamilyRequest, SwasthyalinkError> {
        let created = self.with_graph(|graph| graph.create_request(request.into()))?;
        Ok(created.into())
    }

    /// Accept a pending request.
    pub fn accept_request(&self, id: String) -> Result<FfiFamilyRequest, SwasthyalinkError> {
        let accepted = self.with_graph(|graph| graph.accept_request(&id))?;
        Ok(accepted.into())
    }

    /// Reject a pending request.
    pub fn reject_request(&self, id: String) -> Result<FfiFamilyRequest, SwasthyalinkError> {
        let rejected = self.with_graph(|graph| graph.reject_request(&id))?;
        Ok(rejected.into())
    }

    /// Get requests sent by and pending for an email.
    pub fn get_requests(&self, email: String) -> Result<FfiRequestLists, SwasthyalinkError> {
        let lists = self.with_graph(|graph| graph.get_requests(&email))?;
        Ok(lists.into())
    }

    /// Change the relationship label on a request.
    pub fn update_relationship(
        &self,
        id: String,
        new_relationship: String,
    ) -> Result<(), SwasthyalinkError> {
        self.with_graph(|graph| graph.update_relationship(&id, &new_relationship))
    }

    // =========================================================================
    // Network Operations
    // =========================================================================

    /// Get a user's family network (empty if none exists).
    pub fn get_network(&self, uid: String) -> Result<FfiFamilyNetwork, SwasthyalinkError> {
        let network = self.with_graph(|graph| graph.get_network(&uid))?;
        Ok(network.into())
    }

    /// Set a member's access level and emergency-contact flag.
    pub fn update_member_access(
        &self,
        uid: String,
        member_email: String,
        access_level: String,
        is_emergency_contact: bool,
    ) -> Result<u32, SwasthyalinkError> {
        let level = AccessLevel::from_str(&access_level).ok_or_else(|| {
            SwasthyalinkError::InvalidInput(format!("Unknown access level: {}", access_level))
        })?;
        let updated = self.with_graph(|graph| {
            graph.update_member_access(&uid, &member_email, level, is_emergency_contact)
        })?;
        Ok(updated as u32)
    }

    /// Disable a member of a network, matched by uid or email. The entry is kept.
    pub fn remove_member(&self, uid: String, member: String) -> Result<u32, SwasthyalinkError> {
        let disabled = self.with_graph(|graph| graph.remove_member(&uid, &member))?;
        Ok(disabled as u32)
    }

    /// Disable repeated members of a network.
    pub fn cleanup_duplicates(&self, uid: String) -> Result<u32, SwasthyalinkError> {
        let removed = self.with_graph(|graph| graph.cleanup_duplicates(&uid))?;
        Ok(removed as u32)
    }

    // =========================================================================
    // Notification Operations
    // =========================================================================

    /// Get notifications for a recipient, newest first.
    pub fn list_notifications(
        &self,
        recipient: String,
        limit: u32,
    ) -> Result<Vec<FfiNotification>, SwasthyalinkError> {
        let notifications =
            self.with_graph(|graph| graph.list_notifications(&recipient, limit as usize))?;
        Ok(notifications.into_iter().map(|n| n.into()).collect())
    }

    /// Mark a notification as read.
    pub fn mark_notification_read(&self, id: String) -> Result<(), SwasthyalinkError> {
        self.with_graph(|graph| graph.mark_notification_read(&id))
    }

    /// Mark every notification for a recipient as read.
    pub fn mark_all_notifications_read(&self, recipient: String) -> Result<u32, SwasthyalinkError> {
        let updated = self.with_graph(|graph| graph.mark_all_notifications_read(&recipient))?;
        Ok(updated as u32)
    }

    /// Hide a notification from listings.
    pub fn delete_notification(&self, id: String) -> Result<(), SwasthyalinkError> {
        self.with_graph(|graph| graph.delete_notification(&id))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe request input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewFamilyRequest {
    pub from_uid: String,
    pub from_email: String,
    pub to_uid: Option<String>,
    pub to_email: Option<String>,
    pub to_name: Option<String>,
    pub relationship: String,
}

impl From<FfiNewFamilyRequest> for NewFamilyRequest {
    fn from(input: FfiNewFamilyRequest) -> Self {
        NewFamilyRequest {
            from_uid: input.from_uid,
            from_email: input.from_email,
            to_uid: input.to_uid,
            to_email: input.to_email,
            to_name: input.to_name,
            relationship: input.relationship,
        }
    }
}

/// FFI-safe family request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFamilyRequest {
    pub id: String,
    pub from_uid: String,
    pub from_email: String,
    pub to_uid: Option<String>,
    pub to_email: Option<String>,
    pub to_name: Option<String>,
    pub relationship: String,
    pub status: String,
    pub created_at: String,
    pub responded_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<FamilyRequest> for FfiFamilyRequest {
    fn from(request: FamilyRequest) -> Self {
        Self {
            id: request.id,
            from_uid: request.from_uid,
            from_email: request.from_email,
            to_uid: request.to_uid,
            to_email: request.to_email,
            to_name: request.to_name,
            relationship: request.relationship.to_string(),
            status: request.status.as_str().to_string(),
            created_at: request.created_at,
            responded_at: request.responded_at,
            updated_at: request.updated_at,
        }
    }
}

/// FFI-safe sent/received request lists.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRequestLists {
    pub sent: Vec<FfiFamilyRequest>,
    pub received: Vec<FfiFamilyRequest>,
}

impl From<RequestLists> for FfiRequestLists {
    fn from(lists: RequestLists) -> Self {
        Self {
            sent: lists.sent.into_iter().map(|r| r.into()).collect(),
            received: lists.received.into_iter().map(|r| r.into()).collect(),
        }
    }
}

/// FFI-safe network member.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFamilyMember {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub name: String,
    pub relationship: String,
    pub status: String,
    pub added_at: String,
    pub access_level: String,
    pub is_emergency_contact: bool,
}

impl From<FamilyMember> for FfiFamilyMember {
    fn from(member: FamilyMember) -> Self {
        Self {
            uid: member.uid,
            email: member.email,
            name: member.name,
            relationship: member.relationship.to_string(),
            status: member.status,
            added_at: member.added_at,
            access_level: member.access_level.as_str().to_string(),
            is_emergency_contact: member.is_emergency_contact,
        }
    }
}

/// FFI-safe family network.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFamilyNetwork {
    pub user_uid: String,
    pub members: Vec<FfiFamilyMember>,
}

impl From<FamilyNetwork> for FfiFamilyNetwork {
    fn from(network: FamilyNetwork) -> Self {
        Self {
            user_uid: network.user_uid,
            members: network.members.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub id: String,
    pub recipient_id: String,
    pub kind: String,
    pub message: String,
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

impl From<Notification> for FfiNotification {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            recipient_id: notification.recipient_id,
            kind: notification.kind.as_str().to_string(),
            message: notification.message,
            related_id: notification.related_id,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
