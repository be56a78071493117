//! Port for the cross-environment synchronization engine.

use crate::change_set::domain::{ChangeSetGuid, PublishSummary};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for publisher operations.
pub type PublisherResult<T> = Result<T, PublisherError>;

/// Synchronizes a change set to downstream environments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes the change set identified by `guid`.
    ///
    /// A returned summary may still report `success = false` when individual
    /// objects failed to synchronize; that is a completed publish, not an
    /// error.
    async fn publish(&self, guid: ChangeSetGuid) -> PublisherResult<PublishSummary>;
}

/// Errors returned by publisher adapters.
#[derive(Debug, Clone, Error)]
pub enum PublisherError {
    /// Transient infrastructure failure; the publish may be retried.
    #[error("transient publish failure: {0}")]
    Transient(Arc<dyn std::error::Error + Send + Sync>),

    /// The target environment rejected the change set; retrying cannot help.
    #[error("publish rejected: {0}")]
    Rejected(String),
}

impl PublisherError {
    /// Wraps a transient infrastructure error.
    pub fn transient(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transient(Arc::new(err))
    }

    /// Returns whether retrying may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
