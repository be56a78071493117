//! Change set aggregate root.

use super::{
    BusinessObjectDescriptor, ChangeSetDomainError, ChangeSetGuid, ChangeSetMember,
    ChangeSetState, MemberMetadata, UserGuid,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::{BTreeMap, BTreeSet};

/// Named, user-owned unit of pending change.
///
/// Members, reviewers, and state are private; every mutation goes through the
/// methods below so the open-only and monotonic-state rules always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    guid: ChangeSetGuid,
    name: String,
    description: Option<String>,
    created_by: UserGuid,
    state: ChangeSetState,
    members: BTreeMap<BusinessObjectDescriptor, ChangeSetMember>,
    assigned_users: BTreeSet<UserGuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// Parameter object for reconstructing a persisted change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedChangeSetData {
    /// Persisted identifier.
    pub guid: ChangeSetGuid,
    /// Persisted name.
    pub name: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted creator.
    pub created_by: UserGuid,
    /// Persisted lifecycle state.
    pub state: ChangeSetState,
    /// Persisted members.
    pub members: Vec<ChangeSetMember>,
    /// Persisted reviewer assignments.
    pub assigned_users: Vec<UserGuid>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Number of writes applied since the change set was stored.
    pub revision: u64,
}

fn validated_name(name: &str) -> Result<String, ChangeSetDomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ChangeSetDomainError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

impl ChangeSet {
    /// Creates a new open change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::EmptyName`] when the name is blank.
    pub fn new(
        name: &str,
        description: Option<String>,
        created_by: UserGuid,
        clock: &impl Clock,
    ) -> Result<Self, ChangeSetDomainError> {
        let timestamp = clock.utc();
        Ok(Self {
            guid: ChangeSetGuid::new(),
            name: validated_name(name)?,
            description,
            created_by,
            state: ChangeSetState::Open,
            members: BTreeMap::new(),
            assigned_users: BTreeSet::new(),
            created_at: timestamp,
            updated_at: timestamp,
            revision: 0,
        })
    }

    /// Reconstructs a change set from persisted storage.
    ///
    /// Later members with a repeated descriptor replace earlier ones.
    #[must_use]
    pub fn from_persisted(data: PersistedChangeSetData) -> Self {
        Self {
            guid: data.guid,
            name: data.name,
            description: data.description,
            created_by: data.created_by,
            state: data.state,
            members: data
                .members
                .into_iter()
                .map(|member| (member.descriptor().clone(), member))
                .collect(),
            assigned_users: data.assigned_users.into_iter().collect(),
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the stored revision this copy was loaded at.
    ///
    /// Repositories compare it on write to reject stale copies.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns this copy stamped with `revision`.
    ///
    /// Used by repositories when handing back a freshly written copy.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Returns the change set identifier.
    #[must_use]
    pub const fn guid(&self) -> ChangeSetGuid {
        self.guid
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creator identity.
    #[must_use]
    pub const fn created_by(&self) -> &UserGuid {
        &self.created_by
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ChangeSetState {
        self.state
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Iterates over members in descriptor order.
    pub fn members(&self) -> impl Iterator<Item = &ChangeSetMember> {
        self.members.values()
    }

    /// Returns the member for `descriptor`, if present.
    #[must_use]
    pub fn member(&self, descriptor: &BusinessObjectDescriptor) -> Option<&ChangeSetMember> {
        self.members.get(descriptor)
    }

    /// Returns whether `descriptor` is a member.
    #[must_use]
    pub fn contains(&self, descriptor: &BusinessObjectDescriptor) -> bool {
        self.members.contains_key(descriptor)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterates over assigned reviewers.
    pub fn assigned_users(&self) -> impl Iterator<Item = &UserGuid> {
        self.assigned_users.iter()
    }

    /// Returns whether `user` is the creator or an assigned reviewer.
    #[must_use]
    pub fn involves(&self, user: &UserGuid) -> bool {
        self.created_by == *user || self.assigned_users.contains(user)
    }

    /// Moves the change set to `target`.
    ///
    /// Returns `Ok(false)` when `target` is the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::InvalidStateTransition`] when the
    /// current state is terminal or `target` precedes it.
    pub fn transition_to(
        &mut self,
        target: ChangeSetState,
        clock: &impl Clock,
    ) -> Result<bool, ChangeSetDomainError> {
        if !self.state.can_transition_to(target) {
            return Err(ChangeSetDomainError::InvalidStateTransition {
                guid: self.guid,
                from: self.state,
                to: target,
            });
        }
        if self.state == target {
            return Ok(false);
        }
        self.state = target;
        self.touch(clock);
        Ok(true)
    }

    /// Adds a member, replacing metadata when the descriptor is present.
    ///
    /// Exclusivity across change sets is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open.
    pub fn add_member(
        &mut self,
        descriptor: BusinessObjectDescriptor,
        metadata: MemberMetadata,
        clock: &impl Clock,
    ) -> Result<Option<ChangeSetMember>, ChangeSetDomainError> {
        self.ensure_open()?;
        let member = ChangeSetMember::new(descriptor.clone(), metadata);
        let previous = self.members.insert(descriptor, member);
        self.touch(clock);
        Ok(previous)
    }

    /// Removes the member for `descriptor`. Absent descriptors are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open.
    pub fn remove_member(
        &mut self,
        descriptor: &BusinessObjectDescriptor,
        clock: &impl Clock,
    ) -> Result<Option<ChangeSetMember>, ChangeSetDomainError> {
        self.ensure_open()?;
        let removed = self.members.remove(descriptor);
        if removed.is_some() {
            self.touch(clock);
        }
        Ok(removed)
    }

    /// Assigns a reviewer. Returns `Ok(false)` if already assigned.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open.
    pub fn assign_user(
        &mut self,
        user: UserGuid,
        clock: &impl Clock,
    ) -> Result<bool, ChangeSetDomainError> {
        self.ensure_open()?;
        let inserted = self.assigned_users.insert(user);
        if inserted {
            self.touch(clock);
        }
        Ok(inserted)
    }

    /// Unassigns a reviewer. Returns `Ok(false)` if not assigned.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open.
    pub fn unassign_user(
        &mut self,
        user: &UserGuid,
        clock: &impl Clock,
    ) -> Result<bool, ChangeSetDomainError> {
        self.ensure_open()?;
        let removed = self.assigned_users.remove(user);
        if removed {
            self.touch(clock);
        }
        Ok(removed)
    }

    /// Renames the change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open, or
    /// [`ChangeSetDomainError::EmptyName`] for a blank name.
    pub fn rename(&mut self, name: &str, clock: &impl Clock) -> Result<(), ChangeSetDomainError> {
        self.ensure_open()?;
        self.name = validated_name(name)?;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the description.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open.
    pub fn describe(
        &mut self,
        description: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), ChangeSetDomainError> {
        self.ensure_open()?;
        self.description = description;
        self.touch(clock);
        Ok(())
    }

    /// Checks that members, reviewers, and details may change.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetDomainError::ChangeNotAllowed`] unless open.
    pub const fn ensure_open(&self) -> Result<(), ChangeSetDomainError> {
        match self.state {
            ChangeSetState::Open => Ok(()),
            state => Err(ChangeSetDomainError::ChangeNotAllowed {
                guid: self.guid,
                state,
            }),
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
