use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account that owns a set of medications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque medication identifier. Freshly created medications get a UUIDv4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicationId(pub String);

impl MedicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MedicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MedicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MedicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MedicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
