//! Repository port for change set persistence and claim lookup.

use crate::change_set::domain::{
    BusinessObjectDescriptor, ChangeSet, ChangeSetGuid, ChangeSetState, UserGuid,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for change set repository operations.
pub type ChangeSetRepositoryResult<T> = Result<T, ChangeSetRepositoryError>;

/// Change set persistence contract.
#[async_trait]
pub trait ChangeSetRepository: Send + Sync {
    /// Stores a new change set.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetRepositoryError::DuplicateChangeSet`] when the GUID
    /// already exists.
    async fn store(&self, change_set: &ChangeSet) -> ChangeSetRepositoryResult<()>;

    /// Persists detail, member, and reviewer changes made to an open change
    /// set and returns the stored copy at its new revision.
    ///
    /// The write is a compare-and-set on [`ChangeSet::revision`]. State is
    /// never written here; transitions go through [`ChangeSetStateUpdater`].
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetRepositoryError::NotFound`] when the change set
    /// does not exist, [`ChangeSetRepositoryError::StateConflict`] when the
    /// stored change set is no longer open, or
    /// [`ChangeSetRepositoryError::RevisionConflict`] when `change_set` is
    /// stale.
    async fn update(&self, change_set: &ChangeSet) -> ChangeSetRepositoryResult<ChangeSet>;

    /// Removes a change set and its members.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetRepositoryError::NotFound`] when the change set
    /// does not exist.
    async fn remove(&self, guid: ChangeSetGuid) -> ChangeSetRepositoryResult<()>;

    /// Finds a change set by GUID.
    async fn find_by_guid(&self, guid: ChangeSetGuid)
    -> ChangeSetRepositoryResult<Option<ChangeSet>>;

    /// Returns every change set.
    async fn list_all(&self) -> ChangeSetRepositoryResult<Vec<ChangeSet>>;

    /// Returns change sets created by or assigned to `user`.
    async fn find_by_user(&self, user: &UserGuid) -> ChangeSetRepositoryResult<Vec<ChangeSet>>;

    /// Returns the GUIDs of non-finalized change sets listing `descriptor`.
    async fn find_claiming_guids(
        &self,
        descriptor: &BusinessObjectDescriptor,
    ) -> ChangeSetRepositoryResult<Vec<ChangeSetGuid>>;
}

/// Narrow read port used by the publish pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeSetLoader: Send + Sync {
    /// Loads a change set by GUID, returning `None` when absent.
    async fn load(&self, guid: ChangeSetGuid) -> ChangeSetRepositoryResult<Option<ChangeSet>>;
}

/// Narrow write port persisting a transition already validated by the domain.
#[async_trait]
pub trait ChangeSetStateUpdater: Send + Sync {
    /// Persists `target` as the state of `change_set`.
    ///
    /// Only the state and modification time are written. The transition is
    /// re-checked against the stored state so a concurrent writer can never
    /// move the change set backwards or out of FINALIZED.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSetRepositoryError::NotFound`] when the change set
    /// does not exist, or [`ChangeSetRepositoryError::StateConflict`] when
    /// the stored state does not permit `target`.
    async fn update_state(
        &self,
        change_set: &ChangeSet,
        target: ChangeSetState,
    ) -> ChangeSetRepositoryResult<()>;
}

/// Errors returned by change set repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ChangeSetRepositoryError {
    /// A change set with the same GUID already exists.
    #[error("duplicate change set: {0}")]
    DuplicateChangeSet(ChangeSetGuid),

    /// The change set was not found.
    #[error("change set not found: {0}")]
    NotFound(ChangeSetGuid),

    /// The stored state does not permit the requested write.
    #[error("change set {guid} is {stored}; cannot apply a write requiring {requested}")]
    StateConflict {
        /// Change set identifier.
        guid: ChangeSetGuid,
        /// State currently stored.
        stored: ChangeSetState,
        /// State the write required or requested.
        requested: ChangeSetState,
    },

    /// The write was based on an outdated copy.
    #[error("change set {guid} was modified concurrently (expected revision {expected}, found {actual})")]
    RevisionConflict {
        /// Change set identifier.
        guid: ChangeSetGuid,
        /// Revision the writer loaded.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChangeSetRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
