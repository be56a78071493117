//! Derived membership status of a business object.

use super::{BusinessObjectDescriptor, ChangeSetGuid};
use std::collections::BTreeSet;

/// Which change sets claim one business object, and what that permits.
///
/// Derived on demand, never persisted. An unresolved status fails closed:
/// it reports the object as locked and unavailable to every change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetObjectStatus {
    descriptor: BusinessObjectDescriptor,
    claims: Claims,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Claims {
    Resolved(BTreeSet<ChangeSetGuid>),
    Unresolved,
}

impl ChangeSetObjectStatus {
    /// Builds the status for `descriptor` from the GUIDs claiming it.
    #[must_use]
    pub fn resolve(
        descriptor: BusinessObjectDescriptor,
        claiming: impl IntoIterator<Item = ChangeSetGuid>,
    ) -> Self {
        Self {
            descriptor,
            claims: Claims::Resolved(claiming.into_iter().collect()),
        }
    }

    /// Builds a fail-closed status for a descriptor whose claims are unknown.
    #[must_use]
    pub const fn unresolved(descriptor: BusinessObjectDescriptor) -> Self {
        Self {
            descriptor,
            claims: Claims::Unresolved,
        }
    }

    /// Returns the descriptor this status describes.
    #[must_use]
    pub const fn descriptor(&self) -> &BusinessObjectDescriptor {
        &self.descriptor
    }

    /// Returns the claiming GUIDs, or `None` when unresolved.
    #[must_use]
    pub const fn claiming_guids(&self) -> Option<&BTreeSet<ChangeSetGuid>> {
        match &self.claims {
            Claims::Resolved(guids) => Some(guids),
            Claims::Unresolved => None,
        }
    }

    /// Returns whether the object is a member of `guid`.
    #[must_use]
    pub fn is_member(&self, guid: ChangeSetGuid) -> bool {
        match &self.claims {
            Claims::Resolved(guids) => guids.contains(&guid),
            Claims::Unresolved => false,
        }
    }

    /// Returns whether `guid` may claim the object: nobody else claims it.
    #[must_use]
    pub fn is_available(&self, guid: ChangeSetGuid) -> bool {
        match &self.claims {
            Claims::Resolved(guids) => guids.iter().all(|claimer| *claimer == guid),
            Claims::Unresolved => false,
        }
    }

    /// Returns whether any change set claims the object.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        match &self.claims {
            Claims::Resolved(guids) => !guids.is_empty(),
            Claims::Unresolved => true,
        }
    }
}
