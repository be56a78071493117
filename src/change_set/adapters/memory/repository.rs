//! In-memory change set repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::change_set::{
    domain::{
        BusinessObjectDescriptor, ChangeSet, ChangeSetGuid, ChangeSetState, PersistedChangeSetData,
        UserGuid,
    },
    ports::{
        ChangeSetLoader, ChangeSetRepository, ChangeSetRepositoryError, ChangeSetRepositoryResult,
        ChangeSetStateUpdater,
    },
};

/// Thread-safe in-memory change set repository.
///
/// Can be switched offline to simulate a persistence outage; every call
/// then fails with [`ChangeSetRepositoryError::Persistence`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryChangeSetRepository {
    state: Arc<RwLock<InMemoryChangeSetState>>,
}

#[derive(Debug, Default)]
struct InMemoryChangeSetState {
    change_sets: HashMap<ChangeSetGuid, ChangeSet>,
    offline: bool,
}

impl InMemoryChangeSetRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles the simulated persistence outage.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn set_offline(&self, offline: bool) -> ChangeSetRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.offline = offline;
        Ok(())
    }

    fn read(
        &self,
    ) -> ChangeSetRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryChangeSetState>> {
        let state = self.state.read().map_err(lock_error)?;
        ensure_online(&state)?;
        Ok(state)
    }

    fn write(
        &self,
    ) -> ChangeSetRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryChangeSetState>> {
        let state = self.state.write().map_err(lock_error)?;
        ensure_online(&state)?;
        Ok(state)
    }
}

fn lock_error(err: impl ToString) -> ChangeSetRepositoryError {
    ChangeSetRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn ensure_online(state: &InMemoryChangeSetState) -> ChangeSetRepositoryResult<()> {
    if state.offline {
        return Err(ChangeSetRepositoryError::persistence(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            "change set store is offline",
        )));
    }
    Ok(())
}

/// Rebuilds the stored change set with the state and timestamp of `updated`.
fn with_state(stored: &ChangeSet, updated: &ChangeSet, state: ChangeSetState) -> ChangeSet {
    ChangeSet::from_persisted(PersistedChangeSetData {
        guid: stored.guid(),
        name: stored.name().to_owned(),
        description: stored.description().map(ToOwned::to_owned),
        created_by: stored.created_by().clone(),
        state,
        members: stored.members().cloned().collect(),
        assigned_users: stored.assigned_users().cloned().collect(),
        created_at: stored.created_at(),
        updated_at: updated.updated_at().max(stored.updated_at()),
        revision: stored.revision().saturating_add(1),
    })
}

/// Rebuilds `updated` on top of the stored state and next revision.
fn with_content(stored: &ChangeSet, updated: &ChangeSet) -> ChangeSet {
    ChangeSet::from_persisted(PersistedChangeSetData {
        guid: stored.guid(),
        name: updated.name().to_owned(),
        description: updated.description().map(ToOwned::to_owned),
        created_by: stored.created_by().clone(),
        state: stored.state(),
        members: updated.members().cloned().collect(),
        assigned_users: updated.assigned_users().cloned().collect(),
        created_at: stored.created_at(),
        updated_at: updated.updated_at().max(stored.updated_at()),
        revision: stored.revision().saturating_add(1),
    })
}

#[async_trait]
impl ChangeSetRepository for InMemoryChangeSetRepository {
    async fn store(&self, change_set: &ChangeSet) -> ChangeSetRepositoryResult<()> {
        let mut state = self.write()?;
        if state.change_sets.contains_key(&change_set.guid()) {
            return Err(ChangeSetRepositoryError::DuplicateChangeSet(
                change_set.guid(),
            ));
        }
        state
            .change_sets
            .insert(change_set.guid(), change_set.clone());
        Ok(())
    }

    async fn update(&self, change_set: &ChangeSet) -> ChangeSetRepositoryResult<ChangeSet> {
        let guid = change_set.guid();
        let mut state = self.write()?;
        let slot = state
            .change_sets
            .get_mut(&guid)
            .ok_or(ChangeSetRepositoryError::NotFound(guid))?;
        if slot.state() != ChangeSetState::Open {
            return Err(ChangeSetRepositoryError::StateConflict {
                guid,
                stored: slot.state(),
                requested: ChangeSetState::Open,
            });
        }
        if slot.revision() != change_set.revision() {
            return Err(ChangeSetRepositoryError::RevisionConflict {
                guid,
                expected: change_set.revision(),
                actual: slot.revision(),
            });
        }
        *slot = with_content(slot, change_set);
        Ok(slot.clone())
    }

    async fn remove(&self, guid: ChangeSetGuid) -> ChangeSetRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .change_sets
            .remove(&guid)
            .map(|_| ())
            .ok_or(ChangeSetRepositoryError::NotFound(guid))
    }

    async fn find_by_guid(
        &self,
        guid: ChangeSetGuid,
    ) -> ChangeSetRepositoryResult<Option<ChangeSet>> {
        let state = self.read()?;
        Ok(state.change_sets.get(&guid).cloned())
    }

    async fn list_all(&self) -> ChangeSetRepositoryResult<Vec<ChangeSet>> {
        let state = self.read()?;
        let mut all: Vec<ChangeSet> = state.change_sets.values().cloned().collect();
        all.sort_by_key(ChangeSet::created_at);
        Ok(all)
    }

    async fn find_by_user(&self, user: &UserGuid) -> ChangeSetRepositoryResult<Vec<ChangeSet>> {
        let state = self.read()?;
        let mut found: Vec<ChangeSet> = state
            .change_sets
            .values()
            .filter(|change_set| change_set.involves(user))
            .cloned()
            .collect();
        found.sort_by_key(ChangeSet::created_at);
        Ok(found)
    }

    async fn find_claiming_guids(
        &self,
        descriptor: &BusinessObjectDescriptor,
    ) -> ChangeSetRepositoryResult<Vec<ChangeSetGuid>> {
        let state = self.read()?;
        let mut guids: Vec<ChangeSetGuid> = state
            .change_sets
            .values()
            .filter(|change_set| change_set.state().is_claiming() && change_set.contains(descriptor))
            .map(ChangeSet::guid)
            .collect();
        guids.sort();
        Ok(guids)
    }
}

#[async_trait]
impl ChangeSetLoader for InMemoryChangeSetRepository {
    async fn load(&self, guid: ChangeSetGuid) -> ChangeSetRepositoryResult<Option<ChangeSet>> {
        self.find_by_guid(guid).await
    }
}

#[async_trait]
impl ChangeSetStateUpdater for InMemoryChangeSetRepository {
    async fn update_state(
        &self,
        change_set: &ChangeSet,
        target: ChangeSetState,
    ) -> ChangeSetRepositoryResult<()> {
        let guid = change_set.guid();
        let mut state = self.write()?;
        let slot = state
            .change_sets
            .get_mut(&guid)
            .ok_or(ChangeSetRepositoryError::NotFound(guid))?;
        if !slot.state().can_transition_to(target) {
            return Err(ChangeSetRepositoryError::StateConflict {
                guid,
                stored: slot.state(),
                requested: target,
            });
        }
        *slot = with_state(slot, change_set, target);
        Ok(())
    }
}
