//! Family network models.

use serde::{Deserialize, Serialize};

use super::relationship::Relationship;

/// How much of a member's health data the network owner shares with them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Limited,
    Full,
    Emergency,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Limited => "limited",
            AccessLevel::Full => "full",
            AccessLevel::Emergency => "emergency",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "limited" => Some(AccessLevel::Limited),
            "full" => Some(AccessLevel::Full),
            "emergency" => Some(AccessLevel::Emergency),
            _ => None,
        }
    }
}

/// An accepted entry in a user's family network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// Related user's account ID, if they have one
    pub uid: Option<String>,
    /// Related user's email (secondary match key)
    pub email: Option<String>,
    /// Display name, resolved at acceptance time
    pub name: String,
    pub relationship: Relationship,
    /// Always "accepted"; pending and rejected live on the request
    pub status: String,
    pub added_at: String,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub is_emergency_contact: bool,
}

pub const MEMBER_STATUS_ACCEPTED: &str = "accepted";

impl FamilyMember {
    /// Create an accepted member entry.
    pub fn accepted(
        uid: Option<String>,
        email: Option<String>,
        name: String,
        relationship: Relationship,
    ) -> Self {
        Self {
            uid,
            email,
            name,
            relationship,
            status: MEMBER_STATUS_ACCEPTED.to_string(),
            added_at: chrono::Utc::now().to_rfc3339(),
            access_level: AccessLevel::default(),
            is_emergency_contact: false,
        }
    }

    /// Whether this entry refers to the given email or uid.
    pub fn matches(&self, email: Option<&str>, uid: Option<&str>) -> bool {
        let email_match =
            matches!((self.email.as_deref(), email), (Some(a), Some(b)) if a == b);
        let uid_match = matches!((self.uid.as_deref(), uid), (Some(a), Some(b)) if a == b);
        email_match || uid_match
    }

    /// Key used when collapsing repeated entries: uid, else email.
    pub fn identity_key(&self) -> Option<&str> {
        self.uid.as_deref().or(self.email.as_deref())
    }
}

/// A user's accepted family members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyNetwork {
    pub user_uid: String,
    pub members: Vec<FamilyMember>,
    /// Absent for a network that has never been written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FamilyNetwork {
    /// An empty network for a user with no stored document.
    pub fn empty(user_uid: impl Into<String>) -> Self {
        Self {
            user_uid: user_uid.into(),
            members: Vec::new(),
            updated_at: None,
        }
    }

    /// Whether any member matches the given email or uid.
    pub fn contains(&self, email: Option<&str>, uid: Option<&str>) -> bool {
        self.members.iter().any(|m| m.matches(email, uid))
    }
}
