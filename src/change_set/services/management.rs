//! Change set management: creation, lookup, lifecycle, and publish requests.

use super::{
    error::{ChangeSetServiceError, ChangeSetServiceResult},
    state::{ChangeSetStateMachine, TransitionOutcome},
};
use crate::change_set::{
    config::ChangeSetSettings,
    domain::{
        ChangeSet, ChangeSetGuid, ChangeSetState, PublishTrigger, UserGuid, UserMetadata,
    },
    ports::{ChangeSetRepository, ChangeSetStateUpdater, PublishTriggerSink},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChangeSetRequest {
    name: String,
    description: Option<String>,
    created_by: UserGuid,
}

impl CreateChangeSetRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, created_by: UserGuid) -> Self {
        Self {
            name: name.into(),
            description: None,
            created_by,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for editing change set details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateChangeSetDetailsRequest {
    name: Option<String>,
    description: Option<Option<String>>,
}

impl UpdateChangeSetDetailsRequest {
    /// Creates an empty request that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new description; `None` clears it.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }
}

/// Orchestrates change set lifecycle operations for the admin layer.
#[derive(Clone)]
pub struct ChangeSetManagementService<R, T, C>
where
    R: ChangeSetRepository + ChangeSetStateUpdater,
    T: PublishTriggerSink,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    triggers: Arc<T>,
    state_machine: ChangeSetStateMachine<R, C>,
    clock: Arc<C>,
    settings: ChangeSetSettings,
}

impl<R, T, C> ChangeSetManagementService<R, T, C>
where
    R: ChangeSetRepository + ChangeSetStateUpdater,
    T: PublishTriggerSink,
    C: Clock + Send + Sync,
{
    /// Creates a management service with default settings.
    #[must_use]
    pub fn new(repository: Arc<R>, triggers: Arc<T>, clock: Arc<C>) -> Self {
        Self::with_settings(repository, triggers, clock, ChangeSetSettings::default())
    }

    /// Creates a management service with explicit settings.
    #[must_use]
    pub fn with_settings(
        repository: Arc<R>,
        triggers: Arc<T>,
        clock: Arc<C>,
        settings: ChangeSetSettings,
    ) -> Self {
        Self {
            state_machine: ChangeSetStateMachine::new(Arc::clone(&repository), Arc::clone(&clock)),
            repository,
            triggers,
            clock,
            settings,
        }
    }

    /// Returns whether change sets are enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    const fn ensure_enabled(&self) -> ChangeSetServiceResult<()> {
        if self.settings.enabled {
            Ok(())
        } else {
            Err(ChangeSetServiceError::Disabled)
        }
    }

    async fn load(&self, guid: ChangeSetGuid) -> ChangeSetServiceResult<ChangeSet> {
        self.repository
            .find_by_guid(guid)
            .await?
            .ok_or(ChangeSetServiceError::NotFound(guid))
    }

    /// Creates a new open change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::Disabled`], domain validation errors,
    /// or repository errors.
    pub async fn create(&self, request: CreateChangeSetRequest) -> ChangeSetServiceResult<ChangeSet> {
        self.ensure_enabled()?;
        let change_set = ChangeSet::new(
            &request.name,
            request.description,
            request.created_by,
            &*self.clock,
        )?;
        self.repository.store(&change_set).await?;
        info!(change_set = %change_set.guid(), name = change_set.name(), "change set created");
        Ok(change_set)
    }

    /// Retrieves a change set by GUID.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn get(&self, guid: ChangeSetGuid) -> ChangeSetServiceResult<Option<ChangeSet>> {
        Ok(self.repository.find_by_guid(guid).await?)
    }

    /// Lists every change set.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_all(&self) -> ChangeSetServiceResult<Vec<ChangeSet>> {
        Ok(self.repository.list_all().await?)
    }

    /// Lists change sets created by or assigned to `user`.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_for_user(&self, user: &UserGuid) -> ChangeSetServiceResult<Vec<ChangeSet>> {
        Ok(self.repository.find_by_user(user).await?)
    }

    /// Edits the name and description of an open change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], a `ChangeNotAllowed`
    /// domain error unless open, or repository errors.
    pub async fn update_details(
        &self,
        guid: ChangeSetGuid,
        request: UpdateChangeSetDetailsRequest,
    ) -> ChangeSetServiceResult<ChangeSet> {
        self.ensure_enabled()?;
        let mut change_set = self.load(guid).await?;
        change_set.ensure_open()?;
        if let Some(name) = request.name {
            change_set.rename(&name, &*self.clock)?;
        }
        if let Some(description) = request.description {
            change_set.describe(description, &*self.clock)?;
        }
        Ok(self.repository.update(&change_set).await?)
    }

    /// Removes a change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::CannotRemove`] while the change set
    /// is locked, since a publish may be in flight, plus
    /// [`ChangeSetServiceError::NotFound`] or repository errors.
    pub async fn remove(&self, guid: ChangeSetGuid) -> ChangeSetServiceResult<()> {
        self.ensure_enabled()?;
        let change_set = self.load(guid).await?;
        if change_set.state() == ChangeSetState::Locked {
            return Err(ChangeSetServiceError::CannotRemove {
                guid,
                state: change_set.state(),
            });
        }
        self.repository.remove(guid).await?;
        info!(change_set = %guid, "change set removed");
        Ok(())
    }

    /// Moves a change set to `target` through the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], an
    /// `InvalidStateTransition` domain error, or repository errors.
    pub async fn update_state(
        &self,
        guid: ChangeSetGuid,
        target: ChangeSetState,
    ) -> ChangeSetServiceResult<ChangeSet> {
        self.ensure_enabled()?;
        let mut change_set = self.load(guid).await?;
        self.state_machine.transition(&mut change_set, target).await?;
        Ok(change_set)
    }

    /// Locks a change set and enqueues it for publishing.
    ///
    /// Already-locked change sets are re-queued without a state change.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], an
    /// `InvalidStateTransition` domain error for finalized change sets, or
    /// repository and messaging errors.
    pub async fn request_publish(
        &self,
        guid: ChangeSetGuid,
        initiator: UserGuid,
    ) -> ChangeSetServiceResult<PublishTrigger> {
        self.ensure_enabled()?;
        let mut change_set = self.load(guid).await?;
        let outcome = self
            .state_machine
            .transition(&mut change_set, ChangeSetState::Locked)
            .await?;

        let trigger = PublishTrigger::new(guid)
            .with_change_set_name(change_set.name())
            .with_creator(UserMetadata::new(change_set.created_by().clone()))
            .with_initiator(UserMetadata::new(initiator));
        self.triggers.enqueue(&trigger).await?;
        info!(
            change_set = %guid,
            relocked = matches!(outcome, TransitionOutcome::Unchanged(_)),
            "publish requested"
        );
        Ok(trigger)
    }

    /// Records a confirmed successful publish by finalizing the change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetServiceError::NotFound`], an
    /// `InvalidStateTransition` domain error when already finalized, or
    /// repository errors.
    pub async fn finalize(&self, guid: ChangeSetGuid) -> ChangeSetServiceResult<ChangeSet> {
        self.update_state(guid, ChangeSetState::Finalized).await
    }
}
