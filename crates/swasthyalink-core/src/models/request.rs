//! Family request models.

use serde::{Deserialize, Serialize};

use super::relationship::Relationship;

/// Request workflow status. Terminal once it leaves `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A directed proposal to establish a family relationship.
///
/// `relationship` is the label the target's network will carry for the
/// requester; the requester's own entry gets its inverse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRequest {
    /// Unique request ID
    pub id: String,
    /// Requester account ID
    pub from_uid: String,
    /// Requester email
    pub from_email: String,
    /// Target account ID, if the target has an account
    pub to_uid: Option<String>,
    /// Target email
    pub to_email: Option<String>,
    /// Target display name
    pub to_name: Option<String>,
    pub relationship: Relationship,
    pub status: RequestStatus,
    pub created_at: String,
    /// Set when the request is accepted or rejected
    pub responded_at: Option<String>,
    /// Set when the label is edited
    pub updated_at: Option<String>,
}

impl FamilyRequest {
    /// Create a new pending request.
    pub fn new(input: NewFamilyRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from_uid: input.from_uid,
            from_email: input.from_email,
            to_uid: input.to_uid,
            to_email: input.to_email,
            to_name: input.to_name,
            relationship: Relationship::parse(&input.relationship),
            status: RequestStatus::Pending,
            created_at: chrono::Utc::now().to_rfc3339(),
            responded_at: None,
            updated_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Whether this request targets the given email or display name.
    ///
    /// Absent fields on either side never match.
    pub fn targets(&self, to_email: Option<&str>, to_name: Option<&str>) -> bool {
        let email_match =
            matches!((self.to_email.as_deref(), to_email), (Some(a), Some(b)) if a == b);
        let name_match =
            matches!((self.to_name.as_deref(), to_name), (Some(a), Some(b)) if a == b);
        email_match || name_match
    }

    /// Who should hear about this request: target email, else target name.
    pub fn recipient(&self) -> Option<&str> {
        self.to_email.as_deref().or(self.to_name.as_deref())
    }
}

/// Caller input for creating a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyRequest {
    pub from_uid: String,
    pub from_email: String,
    #[serde(default)]
    pub to_uid: Option<String>,
    #[serde(default)]
    pub to_email: Option<String>,
    #[serde(default)]
    pub to_name: Option<String>,
    pub relationship: String,
}

impl NewFamilyRequest {
    /// Treat blank optional fields as absent and trim required ones.
    pub fn normalized(self) -> Self {
        Self {
            from_uid: self.from_uid.trim().to_string(),
            from_email: self.from_email.trim().to_string(),
            to_uid: non_blank(self.to_uid),
            to_email: non_blank(self.to_email),
            to_name: non_blank(self.to_name),
            relationship: self.relationship.trim().to_string(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Requests visible to one email address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestLists {
    /// Every request this email sent, any status
    pub sent: Vec<FamilyRequest>,
    /// Pending requests addressed to this email
    pub received: Vec<FamilyRequest>,
}
