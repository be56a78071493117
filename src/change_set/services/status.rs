//! Object status resolution against persisted claims.

use crate::change_set::{
    domain::{BusinessObjectDescriptor, ChangeSetObjectStatus},
    ports::ChangeSetRepository,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers membership, availability, and lock queries for business objects.
#[derive(Clone)]
pub struct ObjectStatusResolver<R>
where
    R: ChangeSetRepository,
{
    repository: Arc<R>,
}

impl<R> ObjectStatusResolver<R>
where
    R: ChangeSetRepository,
{
    /// Creates a resolver reading claims from `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolves the status of `descriptor`.
    ///
    /// A failed claim lookup yields a fail-closed status, never an available
    /// one.
    pub async fn status(&self, descriptor: &BusinessObjectDescriptor) -> ChangeSetObjectStatus {
        match self.repository.find_claiming_guids(descriptor).await {
            Ok(guids) => {
                let status = ChangeSetObjectStatus::resolve(descriptor.clone(), guids);
                debug!(object = %descriptor, locked = status.is_locked(), "resolved object status");
                status
            }
            Err(err) => {
                warn!(object = %descriptor, error = %err, "claim lookup failed; reporting object unavailable");
                ChangeSetObjectStatus::unresolved(descriptor.clone())
            }
        }
    }
}
