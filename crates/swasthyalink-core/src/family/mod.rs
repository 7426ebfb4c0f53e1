//! Family network relationship graph.
//!
//! A request moves `pending → accepted | rejected` exactly once. Accepting
//! writes both sides of the relationship and resolves the request in a
//! single [`WriteBatch`]:
//!
//! ```text
//! alice ──request(Parent)──▶ bob
//!
//! accept:
//!   bob's network   += { alice, Parent }   (label as sent)
//!   alice's network += { bob,   Child  }   (inverse label)
//!   request.status   = accepted
//! ```

mod directory;
mod notify;

pub use directory::*;
pub use notify::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{Database, DbError, WriteBatch};
use crate::models::{
    AccessLevel, FamilyMember, FamilyNetwork, FamilyRequest, NewFamilyRequest, Notification,
    Relationship, RequestLists, RequestStatus,
};

/// Default page size for notification listings.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Family graph errors.
#[derive(Error, Debug)]
pub enum FamilyError {
    #[error("Missing required field: {0}")]
    Validation(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage failure: {0}")]
    Dependency(#[source] DbError),
}

impl From<DbError> for FamilyError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::PreconditionFailed(msg) => FamilyError::InvalidState(msg),
            other => FamilyError::Dependency(other),
        }
    }
}

impl FamilyError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            FamilyError::Validation(_) | FamilyError::InvalidBody(_) => "validation",
            FamilyError::Conflict(_) => "conflict",
            FamilyError::NotFound(_) => "not_found",
            FamilyError::InvalidState(_) => "invalid_state",
            FamilyError::Dependency(_) => "dependency",
        }
    }

    /// Suggested HTTP status for transport layers.
    pub fn http_status(&self) -> u16 {
        match self {
            FamilyError::Validation(_) | FamilyError::InvalidBody(_) => 400,
            FamilyError::Conflict(_) => 409,
            FamilyError::NotFound(_) => 404,
            FamilyError::InvalidState(_) => 400,
            FamilyError::Dependency(_) => 500,
        }
    }
}

pub type FamilyResult<T> = Result<T, FamilyError>;

/// Family graph operations over a database.
pub struct FamilyGraph<'a> {
    db: &'a Database,
    names: &'a dyn NameResolver,
    notifier: &'a dyn NotificationSink,
}

impl<'a> FamilyGraph<'a> {
    /// Resolve names from the `users` table and store notifications in the database.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            names: db,
            notifier: db,
        }
    }

    /// Use a different name resolver.
    pub fn with_names(mut self, names: &'a dyn NameResolver) -> Self {
        self.names = names;
        self
    }

    /// Use a different notification sink.
    pub fn with_notifier(mut self, notifier: &'a dyn NotificationSink) -> Self {
        self.notifier = notifier;
        self
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Create a pending request after checking for existing membership and
    /// duplicate pending requests.
    pub fn create_request(&self, input: NewFamilyRequest) -> FamilyResult<FamilyRequest> {
        let input = input.normalized();
        required("fromUid", &input.from_uid)?;
        required("fromEmail", &input.from_email)?;
        required("relationship", &input.relationship)?;
        if input.to_email.is_none() && input.to_name.is_none() {
            return Err(FamilyError::Validation("toEmail or toName".into()));
        }

        let request = FamilyRequest::new(input);

        // Checks and insert share one write transaction so two identical
        // submissions cannot both pass the pending check.
        self.db.atomically(|db| {
            let already_member = db
                .get_network(&request.from_uid)?
                .map(|network| {
                    network.contains(request.to_email.as_deref(), request.to_uid.as_deref())
                })
                .unwrap_or(false);
            if already_member {
                return Err(FamilyError::Conflict("Already in family network".into()));
            }

            let already_pending = db
                .list_pending_requests_from(&request.from_email)?
                .iter()
                .any(|r| r.targets(request.to_email.as_deref(), request.to_name.as_deref()));
            if already_pending {
                return Err(FamilyError::Conflict("Request already pending".into()));
            }

            db.insert_request(&request)?;
            Ok(())
        })?;

        info!(
            request_id = %request.id,
            from = %request.from_email,
            relationship = %request.relationship,
            "Family request created"
        );

        if let Some(notification) = Notification::request_received(&request) {
            self.notifier.emit(notification);
        }

        Ok(request)
    }

    /// Accept a pending request, adding each party to the other's network.
    pub fn accept_request(&self, id: &str) -> FamilyResult<FamilyRequest> {
        let id = required("id", id)?;
        let mut request = self.load_request(id)?;
        if request.status.is_terminal() {
            return Err(FamilyError::InvalidState("Request already processed".into()));
        }

        let target_name = request
            .to_email
            .as_deref()
            .and_then(|email| self.names.resolve_name(email))
            .or_else(|| request.to_name.clone())
            .or_else(|| request.to_email.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let requester_name = self
            .names
            .resolve_name(&request.from_email)
            .unwrap_or_else(|| request.from_email.clone());

        let target_uid = match (&request.to_uid, &request.to_email) {
            (Some(uid), _) => Some(uid.clone()),
            (None, Some(email)) => self.db.find_user_by_email(email)?.map(|user| user.uid),
            (None, None) => None,
        };

        let responded_at = chrono::Utc::now().to_rfc3339();
        let mut batch = WriteBatch::new();

        match &target_uid {
            Some(target_uid) => batch.append_member(
                target_uid.as_str(),
                FamilyMember::accepted(
                    Some(request.from_uid.clone()),
                    Some(request.from_email.clone()),
                    requester_name,
                    request.relationship.clone(),
                ),
            ),
            None => warn!(
                request_id = %request.id,
                "Target has no account, only the requester's network is updated"
            ),
        }

        batch.append_member(
            request.from_uid.as_str(),
            FamilyMember::accepted(
                target_uid.clone(),
                request.to_email.clone(),
                target_name.clone(),
                request.relationship.inverse(),
            ),
        );
        batch.resolve_request(request.id.as_str(), RequestStatus::Accepted, responded_at.as_str());

        self.db.commit_batch(&batch)?;

        info!(
            request_id = %request.id,
            from_uid = %request.from_uid,
            to_uid = target_uid.as_deref().unwrap_or("-"),
            "Family request accepted"
        );

        request.status = RequestStatus::Accepted;
        request.responded_at = Some(responded_at);
        self.notifier
            .emit(Notification::request_accepted(&request, &target_name));

        Ok(request)
    }

    /// Reject a pending request. Networks are untouched.
    pub fn reject_request(&self, id: &str) -> FamilyResult<FamilyRequest> {
        let id = required("id", id)?;
        let mut request = self.load_request(id)?;
        if request.status.is_terminal() {
            return Err(FamilyError::InvalidState("Request already processed".into()));
        }

        let responded_at = chrono::Utc::now().to_rfc3339();
        self.db
            .resolve_request(&request.id, RequestStatus::Rejected, &responded_at)?;

        info!(request_id = %request.id, "Family request rejected");

        request.status = RequestStatus::Rejected;
        request.responded_at = Some(responded_at);
        self.notifier.emit(Notification::request_rejected(&request));

        Ok(request)
    }

    /// Relabel a request. Members created by an earlier acceptance keep
    /// their labels.
    pub fn update_relationship(&self, id: &str, relationship: &str) -> FamilyResult<()> {
        let id = required("requestId", id)?;
        let relationship = Relationship::parse(required("newRelationship", relationship)?);

        let updated_at = chrono::Utc::now().to_rfc3339();
        if !self
            .db
            .update_request_relationship(id, &relationship, &updated_at)?
        {
            return Err(FamilyError::NotFound(format!("Request {}", id)));
        }

        debug!(request_id = id, relationship = %relationship, "Request relabelled");
        Ok(())
    }

    /// Requests sent by `email` (any status) and pending requests addressed to it.
    pub fn get_requests(&self, email: &str) -> FamilyResult<RequestLists> {
        let email = required("email", email)?;
        Ok(RequestLists {
            sent: self.db.list_requests_from(email)?,
            received: self.db.list_pending_requests_to(email)?,
        })
    }

    // =========================================================================
    // Networks
    // =========================================================================

    /// A user's network; empty if none has been created yet.
    pub fn get_network(&self, uid: &str) -> FamilyResult<FamilyNetwork> {
        let uid = required("uid", uid)?;
        Ok(self
            .db
            .get_network(uid)?
            .unwrap_or_else(|| FamilyNetwork::empty(uid)))
    }

    /// Change sharing options for a member, matched by email.
    pub fn update_member_access(
        &self,
        uid: &str,
        member_email: &str,
        access_level: AccessLevel,
        is_emergency_contact: bool,
    ) -> FamilyResult<usize> {
        let uid = required("userUid", uid)?;
        let member_email = required("memberEmail", member_email)?;

        let updated =
            self.db
                .update_member_access(uid, member_email, access_level, is_emergency_contact)?;
        if updated == 0 {
            return Err(FamilyError::NotFound(format!(
                "Member {} in network {}",
                member_email, uid
            )));
        }

        info!(
            uid,
            member = member_email,
            access_level = access_level.as_str(),
            is_emergency_contact,
            "Member access updated"
        );
        Ok(updated)
    }

    /// Disable a member of `uid`'s network, matched by uid or email.
    ///
    /// The entry is hidden from the network but kept in storage. A disabled
    /// member no longer blocks a new request to the same person.
    pub fn remove_member(&self, uid: &str, member: &str) -> FamilyResult<usize> {
        let uid = required("userUid", uid)?;
        let member = required("memberUid", member)?;

        let disabled_at = chrono::Utc::now().to_rfc3339();
        let disabled = self.db.disable_member(uid, member, &disabled_at)?;
        if disabled == 0 {
            return Err(FamilyError::NotFound(format!(
                "Member {} in network {}",
                member, uid
            )));
        }

        info!(uid, member, disabled, "Family member disabled");
        Ok(disabled)
    }

    /// Disable repeated members of a network. Returns how many were disabled.
    pub fn cleanup_duplicates(&self, uid: &str) -> FamilyResult<usize> {
        let uid = required("uid", uid)?;
        let disabled_at = chrono::Utc::now().to_rfc3339();
        let disabled: usize = self.db.atomically(|db| {
            db.disable_duplicate_members(uid, &disabled_at)
                .map_err(FamilyError::from)
        })?;

        if disabled > 0 {
            info!(uid, disabled, "Disabled duplicate family members");
        }
        Ok(disabled)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Notifications for a recipient, newest first. A zero limit uses the default.
    pub fn list_notifications(
        &self,
        recipient: &str,
        limit: usize,
    ) -> FamilyResult<Vec<Notification>> {
        let recipient = required("userId", recipient)?;
        let limit = if limit == 0 {
            DEFAULT_NOTIFICATION_LIMIT
        } else {
            limit
        };
        Ok(self.db.list_notifications(recipient, limit)?)
    }

    pub fn mark_notification_read(&self, id: &str) -> FamilyResult<()> {
        let id = required("notificationId", id)?;
        if !self.db.mark_notification_read(id)? {
            return Err(FamilyError::NotFound(format!("Notification {}", id)));
        }
        Ok(())
    }

    /// Mark all of a recipient's notifications as read. Returns how many changed.
    pub fn mark_all_notifications_read(&self, recipient: &str) -> FamilyResult<usize> {
        let recipient = required("userId", recipient)?;
        let updated = self.db.mark_all_notifications_read(recipient)?;
        debug!(recipient, updated, "Notifications marked read");
        Ok(updated)
    }

    /// Hide a notification from listings.
    pub fn delete_notification(&self, id: &str) -> FamilyResult<()> {
        let id = required("notificationId", id)?;
        let disabled_at = chrono::Utc::now().to_rfc3339();
        if !self.db.disable_notification(id, &disabled_at)? {
            return Err(FamilyError::NotFound(format!("Notification {}", id)));
        }
        Ok(())
    }

    fn load_request(&self, id: &str) -> FamilyResult<FamilyRequest> {
        self.db
            .get_request(id)?
            .ok_or_else(|| FamilyError::NotFound(format!("Request {}", id)))
    }
}

/// Trimmed value of a required field, or a validation error naming it.
fn required<'v>(field: &str, value: &'v str) -> FamilyResult<&'v str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FamilyError::Validation(field.to_string()));
    }
    Ok(value)
}
