//! Persistence-independent identity of a business object.

use super::ChangeSetDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a domain object by `(object_type, object_identifier)`.
///
/// Descriptors carry no ownership semantics; two descriptors with the same
/// type and identifier refer to the same business object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessObjectDescriptor {
    object_type: String,
    object_identifier: String,
}

impl BusinessObjectDescriptor {
    /// Creates a validated descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::EmptyObjectType`] or
    /// [`ChangeSetDomainError::EmptyObjectIdentifier`] when either part is
    /// blank after trimming.
    pub fn new(
        object_type: impl Into<String>,
        object_identifier: impl Into<String>,
    ) -> Result<Self, ChangeSetDomainError> {
        let object_type = object_type.into().trim().to_owned();
        if object_type.is_empty() {
            return Err(ChangeSetDomainError::EmptyObjectType);
        }
        let object_identifier = object_identifier.into().trim().to_owned();
        if object_identifier.is_empty() {
            return Err(ChangeSetDomainError::EmptyObjectIdentifier);
        }
        Ok(Self {
            object_type,
            object_identifier,
        })
    }

    /// Returns the business object type, e.g. `Product`.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the business object identifier, e.g. a product code.
    #[must_use]
    pub fn object_identifier(&self) -> &str {
        &self.object_identifier
    }
}

impl fmt::Display for BusinessObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_identifier)
    }
}
