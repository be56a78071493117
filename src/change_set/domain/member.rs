//! Change set members and their metadata.

use super::BusinessObjectDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key recording which action the member represents.
pub const ACTION_METADATA_KEY: &str = "action";

/// String-keyed metadata attached to a member.
pub type MemberMetadata = BTreeMap<String, String>;

/// Kind of modification a member carries, stored under [`ACTION_METADATA_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    /// The object is new in this change set.
    Add,
    /// The object was modified.
    Edit,
    /// The object is deleted by this change set.
    Delete,
}

impl MemberAction {
    /// Returns the canonical metadata representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A business object claimed by a change set.
///
/// Equality within a change set is by descriptor alone; the change set keys
/// its members by descriptor so re-adding replaces metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetMember {
    descriptor: BusinessObjectDescriptor,
    metadata: MemberMetadata,
}

impl ChangeSetMember {
    /// Creates a member from a descriptor and its metadata.
    #[must_use]
    pub const fn new(descriptor: BusinessObjectDescriptor, metadata: MemberMetadata) -> Self {
        Self {
            descriptor,
            metadata,
        }
    }

    /// Returns the member descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &BusinessObjectDescriptor {
        &self.descriptor
    }

    /// Returns the member metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MemberMetadata {
        &self.metadata
    }

    /// Returns the recorded action, if the metadata carries a known one.
    #[must_use]
    pub fn action(&self) -> Option<MemberAction> {
        self.metadata
            .get(ACTION_METADATA_KEY)
            .and_then(|value| MemberAction::parse(value))
    }
}
