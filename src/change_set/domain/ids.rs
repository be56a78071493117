//! Identifier types for the change set domain.

use super::ChangeSetDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Natural key of a change set (its object group identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSetGuid(Uuid);

impl ChangeSetGuid {
    /// Creates a new random change set identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a change set identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ChangeSetGuid {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for ChangeSetGuid {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ChangeSetGuid {
    type Err = ChangeSetDomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ChangeSetDomainError::InvalidGuid(value.to_owned()))
    }
}

impl fmt::Display for ChangeSetGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user who creates, reviews, or publishes change sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserGuid(String);

impl UserGuid {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::EmptyUserGuid`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ChangeSetDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ChangeSetDomainError::EmptyUserGuid);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserGuid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
