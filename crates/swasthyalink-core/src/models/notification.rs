//! User-facing notifications and account directory entries.

use serde::{Deserialize, Serialize};

use super::request::FamilyRequest;

/// Notification type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FamilyRequest,
    FamilyRequestAccepted,
    FamilyRequestRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FamilyRequest => "family_request",
            NotificationKind::FamilyRequestAccepted => "family_request_accepted",
            NotificationKind::FamilyRequestRejected => "family_request_rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "family_request" => Some(NotificationKind::FamilyRequest),
            "family_request_accepted" => Some(NotificationKind::FamilyRequestAccepted),
            "family_request_rejected" => Some(NotificationKind::FamilyRequestRejected),
            _ => None,
        }
    }
}

/// An alert shown to a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Email (or display name, for targets without an email)
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// ID of the request that triggered it
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

impl Notification {
    pub fn new(recipient_id: String, kind: NotificationKind, message: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            recipient_id,
            kind,
            message,
            related_id: None,
            read: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Tell the target that someone sent them a request.
    pub fn request_received(request: &FamilyRequest) -> Option<Self> {
        let recipient = request.recipient()?;
        let message = format!(
            "{} sent you a family request for relationship: {}",
            request.from_email, request.relationship
        );
        Some(
            Self::new(recipient.to_string(), NotificationKind::FamilyRequest, message)
                .related(&request.id),
        )
    }

    /// Tell the requester their request was accepted.
    pub fn request_accepted(request: &FamilyRequest, target_name: &str) -> Self {
        let message = format!("{} accepted your family request", target_name);
        Self::new(
            request.from_email.clone(),
            NotificationKind::FamilyRequestAccepted,
            message,
        )
        .related(&request.id)
    }

    /// Tell the requester their request was declined.
    pub fn request_rejected(request: &FamilyRequest) -> Self {
        let who = request.recipient().unwrap_or("The recipient");
        let message = format!("{} declined your family request", who);
        Self::new(
            request.from_email.clone(),
            NotificationKind::FamilyRequestRejected,
            message,
        )
        .related(&request.id)
    }

    fn related(mut self, id: &str) -> Self {
        self.related_id = Some(id.to_string());
        self
    }
}

/// An account in the user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub name: String,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name: name.into(),
        }
    }
}
