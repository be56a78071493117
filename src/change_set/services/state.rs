//! State machine service: validates transitions and persists them.

use super::error::ChangeSetServiceResult;
use crate::change_set::{
    domain::{ChangeSet, ChangeSetState},
    ports::ChangeSetStateUpdater,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The state changed and was persisted.
    Changed {
        /// Previous state.
        from: ChangeSetState,
        /// New state.
        to: ChangeSetState,
    },
    /// The change set was already in the requested state; nothing persisted.
    Unchanged(ChangeSetState),
}

/// Enforces monotonic change set transitions.
///
/// The domain validates; the [`ChangeSetStateUpdater`] persists. The caller's
/// copy is only updated once persistence succeeds.
#[derive(Clone)]
pub struct ChangeSetStateMachine<U, C>
where
    U: ChangeSetStateUpdater,
    C: Clock + Send + Sync,
{
    updater: Arc<U>,
    clock: Arc<C>,
}

impl<U, C> ChangeSetStateMachine<U, C>
where
    U: ChangeSetStateUpdater,
    C: Clock + Send + Sync,
{
    /// Creates a state machine persisting through `updater`.
    #[must_use]
    pub const fn new(updater: Arc<U>, clock: Arc<C>) -> Self {
        Self { updater, clock }
    }

    /// Moves `change_set` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`super::ChangeSetServiceError::Domain`] wrapping
    /// `InvalidStateTransition` when the change set is finalized or `target`
    /// precedes the current state, or a repository error when persisting
    /// fails. `change_set` is untouched on error.
    pub async fn transition(
        &self,
        change_set: &mut ChangeSet,
        target: ChangeSetState,
    ) -> ChangeSetServiceResult<TransitionOutcome> {
        let from = change_set.state();
        let mut next = change_set.clone();
        if !next.transition_to(target, &*self.clock)? {
            debug!(change_set = %change_set.guid(), state = %from, "transition is a no-op");
            return Ok(TransitionOutcome::Unchanged(from));
        }
        self.updater.update_state(&next, target).await?;
        *change_set = next;
        info!(change_set = %change_set.guid(), %from, to = %target, "change set state changed");
        Ok(TransitionOutcome::Changed { from, to: target })
    }
}
