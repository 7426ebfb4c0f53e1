//! Relationship vocabulary and inverse mapping.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A family relationship label.
///
/// The fixed vocabulary has a defined inverse. Any other label is kept
/// verbatim in [`Relationship::Other`] and is its own inverse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relationship {
    Parent,
    Child,
    Spouse,
    Sibling,
    Grandparent,
    Grandchild,
    Uncle,
    Aunt,
    /// Only produced as the inverse of `Uncle` / `Aunt`
    NephewNiece,
    Cousin,
    Friend,
    Caregiver,
    Patient,
    /// Free-form label outside the vocabulary
    Other(String),
}

impl Relationship {
    /// Parse a label. Matching is exact, unknown labels become `Other`.
    pub fn parse(label: &str) -> Self {
        match label {
            "Parent" => Relationship::Parent,
            "Child" => Relationship::Child,
            "Spouse" => Relationship::Spouse,
            "Sibling" => Relationship::Sibling,
            "Grandparent" => Relationship::Grandparent,
            "Grandchild" => Relationship::Grandchild,
            "Uncle" => Relationship::Uncle,
            "Aunt" => Relationship::Aunt,
            "Nephew/Niece" => Relationship::NephewNiece,
            "Cousin" => Relationship::Cousin,
            "Friend" => Relationship::Friend,
            "Caregiver" => Relationship::Caregiver,
            "Patient" => Relationship::Patient,
            other => Relationship::Other(other.to_string()),
        }
    }

    /// Stored label.
    pub fn as_str(&self) -> &str {
        match self {
            Relationship::Parent => "Parent",
            Relationship::Child => "Child",
            Relationship::Spouse => "Spouse",
            Relationship::Sibling => "Sibling",
            Relationship::Grandparent => "Grandparent",
            Relationship::Grandchild => "Grandchild",
            Relationship::Uncle => "Uncle",
            Relationship::Aunt => "Aunt",
            Relationship::NephewNiece => "Nephew/Niece",
            Relationship::Cousin => "Cousin",
            Relationship::Friend => "Friend",
            Relationship::Caregiver => "Caregiver",
            Relationship::Patient => "Patient",
            Relationship::Other(label) => label,
        }
    }

    /// The label the other party receives.
    ///
    /// `Nephew/Niece` has no single inverse (it could be either `Uncle` or
    /// `Aunt`), so like free-form labels it maps to itself.
    pub fn inverse(&self) -> Relationship {
        match self {
            Relationship::Parent => Relationship::Child,
            Relationship::Child => Relationship::Parent,
            Relationship::Spouse => Relationship::Spouse,
            Relationship::Sibling => Relationship::Sibling,
            Relationship::Grandparent => Relationship::Grandchild,
            Relationship::Grandchild => Relationship::Grandparent,
            Relationship::Uncle | Relationship::Aunt => Relationship::NephewNiece,
            Relationship::Cousin => Relationship::Cousin,
            Relationship::Friend => Relationship::Friend,
            Relationship::Caregiver => Relationship::Patient,
            Relationship::Patient => Relationship::Caregiver,
            other => other.clone(),
        }
    }

    /// Whether the label is part of the fixed vocabulary.
    pub fn is_known(&self) -> bool {
        !matches!(self, Relationship::Other(_))
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Relationship {
    fn from(label: &str) -> Self {
        Relationship::parse(label)
    }
}

impl From<String> for Relationship {
    fn from(label: String) -> Self {
        Relationship::parse(&label)
    }
}

// Serialized as the bare label so stored documents stay readable.
impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Relationship::parse(&label))
    }
}
