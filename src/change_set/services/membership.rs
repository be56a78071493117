//! Membership service: adds and removes objects and reviewers.

use super::{
    error::{ChangeSetServiceError, ChangeSetServiceResult},
    status::ObjectStatusResolver,
};
use crate::change_set::{
    config::ChangeSetSettings,
    domain::{
        BusinessObjectDescriptor, ChangeSet, ChangeSetDomainError, ChangeSetGuid, ChangeSetMember,
        MemberAction, MemberMetadata, UserGuid,
    },
    ports::ChangeSetRepository,
};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Mutates change set membership while preserving object exclusivity.
///
/// Availability checks and member writes are serialized within this service
/// so two open change sets in one process cannot both claim an object.
/// Writes are compare-and-set against the stored revision, so a change set
/// locked or finalized after it was loaded rejects the write.
#[derive(Clone)]
pub struct ChangeSetMembershipService<R, C>
where
    R: ChangeSetRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    resolver: ObjectStatusResolver<R>,
    clock: Arc<C>,
    settings: ChangeSetSettings,
    claim_guard: Arc<Mutex<()>>,
}

impl<R, C> ChangeSetMembershipService<R, C>
where
    R: ChangeSetRepository,
    C: Clock + Send + Sync,
{
    /// Creates a membership service with default settings.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_settings(repository, clock, ChangeSetSettings::default())
    }

    /// Creates a membership service with explicit settings.
    #[must_use]
    pub fn with_settings(repository: Arc<R>, clock: Arc<C>, settings: ChangeSetSettings) -> Self {
        Self {
            resolver: ObjectStatusResolver::new(Arc::clone(&repository)),
            repository,
            clock,
            settings,
            claim_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the status resolver used for availability checks.
    #[must_use]
    pub const fn resolver(&self) -> &ObjectStatusResolver<R> {
        &self.resolver
    }

    async fn load(&self, guid: ChangeSetGuid) -> ChangeSetServiceResult<ChangeSet> {
        self.repository
            .find_by_guid(guid)
            .await?
            .ok_or(ChangeSetServiceError::NotFound(guid))
    }

    const fn ensure_enabled(&self) -> ChangeSetServiceResult<()> {
        if self.settings.enabled {
            Ok(())
        } else {
            Err(ChangeSetServiceError::Disabled)
        }
    }

    async fn modify<T>(
        &self,
        guid: ChangeSetGuid,
        mutate: impl FnOnce(&mut ChangeSet, &C) -> Result<T, ChangeSetDomainError> + Send,
    ) -> ChangeSetServiceResult<(ChangeSet, T)> {
        self.ensure_enabled()?;
        let _claim = self.claim_guard.lock().await;
        let mut change_set = self.load(guid).await?;
        let outcome = mutate(&mut change_set, &*self.clock)?;
        let stored = self.repository.update(&change_set).await?;
        Ok((stored, outcome))
    }

    /// Adds `descriptor` to the change set, replacing metadata if it is
    /// already a member.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`] for an unknown change set,
    /// a `ChangeNotAllowed` domain error unless the change set is open,
    /// [`ChangeSetServiceError::ObjectUnavailable`] when another change set
    /// claims the object or its status cannot be resolved, or repository
    /// errors, including a `StateConflict` when the change set was locked
    /// while the member was being added.
    pub async fn add_object(
        &self,
        guid: ChangeSetGuid,
        descriptor: BusinessObjectDescriptor,
        metadata: MemberMetadata,
    ) -> ChangeSetServiceResult<ChangeSet> {
        self.ensure_enabled()?;
        let _claim = self.claim_guard.lock().await;
        let mut change_set = self.load(guid).await?;
        change_set.ensure_open()?;

        let status = self.resolver.status(&descriptor).await;
        if !status.is_available(guid) {
            return Err(ChangeSetServiceError::ObjectUnavailable { descriptor, guid });
        }

        let replaced = change_set.add_member(descriptor.clone(), metadata, &*self.clock)?;
        let stored = self.repository.update(&change_set).await?;
        info!(
            change_set = %guid,
            object = %descriptor,
            replaced = replaced.is_some(),
            "object added to change set"
        );
        Ok(stored)
    }

    /// Removes `descriptor` from the change set; absent objects are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], a `ChangeNotAllowed`
    /// domain error unless open, or repository errors.
    pub async fn remove_object(
        &self,
        guid: ChangeSetGuid,
        descriptor: &BusinessObjectDescriptor,
    ) -> ChangeSetServiceResult<ChangeSet> {
        let (change_set, removed) = self
            .modify(guid, |change_set, clock| {
                change_set.remove_member(descriptor, clock)
            })
            .await?;
        debug!(change_set = %guid, object = %descriptor, removed = removed.is_some(), "remove object");
        Ok(change_set)
    }

    /// Assigns a reviewer. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], a `ChangeNotAllowed`
    /// domain error unless open, or repository errors.
    pub async fn assign_user(
        &self,
        guid: ChangeSetGuid,
        user: UserGuid,
    ) -> ChangeSetServiceResult<ChangeSet> {
        let (change_set, _) = self
            .modify(guid, |change_set, clock| change_set.assign_user(user, clock))
            .await?;
        Ok(change_set)
    }

    /// Unassigns a reviewer. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], a `ChangeNotAllowed`
    /// domain error unless open, or repository errors.
    pub async fn unassign_user(
        &self,
        guid: ChangeSetGuid,
        user: &UserGuid,
    ) -> ChangeSetServiceResult<ChangeSet> {
        let (change_set, _) = self
            .modify(guid, |change_set, clock| change_set.unassign_user(user, clock))
            .await?;
        Ok(change_set)
    }

    /// Returns a page of members ordered by descriptor.
    ///
    /// An empty `object_types` filter matches every member.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`] or repository errors.
    pub async fn list_members(
        &self,
        guid: ChangeSetGuid,
        object_types: &[&str],
        offset: usize,
        limit: usize,
    ) -> ChangeSetServiceResult<Vec<ChangeSetMember>> {
        let change_set = self.load(guid).await?;
        Ok(change_set
            .members()
            .filter(|member| of_types(member, object_types))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    /// Counts members matching `object_types`; an empty filter counts all.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`] or repository errors.
    pub async fn member_count(
        &self,
        guid: ChangeSetGuid,
        object_types: &[&str],
    ) -> ChangeSetServiceResult<usize> {
        let change_set = self.load(guid).await?;
        Ok(change_set
            .members()
            .filter(|member| of_types(member, object_types))
            .count())
    }

    /// Returns the metadata recorded for `descriptor` in the change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`] or repository errors.
    pub async fn find_member_metadata(
        &self,
        guid: ChangeSetGuid,
        descriptor: &BusinessObjectDescriptor,
    ) -> ChangeSetServiceResult<Option<MemberMetadata>> {
        let change_set = self.load(guid).await?;
        Ok(change_set
            .member(descriptor)
            .map(|member| member.metadata().clone()))
    }

    /// Returns whether the object still exists from the change set's point of
    /// view, i.e. it is not a member marked for deletion.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`] or repository errors.
    pub async fn object_exists(
        &self,
        guid: ChangeSetGuid,
        descriptor: &BusinessObjectDescriptor,
    ) -> ChangeSetServiceResult<bool> {
        let change_set = self.load(guid).await?;
        let deleted = change_set
            .member(descriptor)
            .and_then(|member| member.action())
            == Some(MemberAction::Delete);
        Ok(!deleted)
    }

    /// Returns the single change set claiming `descriptor`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::InconsistentClaims`] when more than one
    /// change set claims the object, or repository errors.
    pub async fn find_change_set_guid(
        &self,
        descriptor: &BusinessObjectDescriptor,
    ) -> ChangeSetServiceResult<Option<ChangeSetGuid>> {
        let guids = self.repository.find_claiming_guids(descriptor).await?;
        match guids.as_slice() {
            [] => Ok(None),
            [guid] => Ok(Some(*guid)),
            _ => Err(ChangeSetServiceError::InconsistentClaims {
                descriptor: descriptor.clone(),
                guids,
            }),
        }
    }

    /// Maps each locked descriptor to the change set claiming it.
    ///
    /// Unclaimed descriptors are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::InconsistentClaims`] or repository
    /// errors.
    pub async fn find_locked_objects(
        &self,
        descriptors: &[BusinessObjectDescriptor],
    ) -> ChangeSetServiceResult<BTreeMap<BusinessObjectDescriptor, ChangeSetGuid>> {
        let mut locked = BTreeMap::new();
        for descriptor in descriptors {
            if let Some(guid) = self.find_change_set_guid(descriptor).await? {
                locked.insert(descriptor.clone(), guid);
            }
        }
        Ok(locked)
    }

    /// Maps each descriptor claimed by a change set other than `excluded` to
    /// that change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::InconsistentClaims`] or repository
    /// errors.
    pub async fn find_claimed_elsewhere(
        &self,
        descriptors: &[BusinessObjectDescriptor],
        excluded: ChangeSetGuid,
    ) -> ChangeSetServiceResult<BTreeMap<BusinessObjectDescriptor, ChangeSetGuid>> {
        let mut claimed = self.find_locked_objects(descriptors).await?;
        claimed.retain(|_, guid| *guid != excluded);
        Ok(claimed)
    }
}

fn of_types(member: &ChangeSetMember, object_types: &[&str]) -> bool {
    object_types.is_empty() || object_types.contains(&member.descriptor().object_type())
}
