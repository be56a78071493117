//! Publish pipeline: load, publish, emit.

use super::events::ChangeSetEventFactory;
use crate::change_set::{
    domain::{ChangeSetCompletionEvent, ChangeSetGuid, PublishTrigger},
    ports::{
        ChangeSetLoader, ChangeSetRepositoryError, CompletionEventSink, MessagingError, Publisher,
        PublisherError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised by one pipeline attempt.
#[derive(Debug, Clone, Error)]
pub enum PublishPipelineError {
    /// The change set does not exist. Never recoverable.
    #[error("change set {0} not found")]
    NotFound(ChangeSetGuid),

    /// Loading the change set failed.
    #[error(transparent)]
    Repository(#[from] ChangeSetRepositoryError),

    /// The external publisher failed.
    #[error(transparent)]
    Publisher(#[from] PublisherError),

    /// Emitting the completion event failed.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// The external publisher did not answer in time.
    #[error("publishing change set {guid} timed out after {timeout_ms} ms")]
    Timeout {
        /// Change set identifier.
        guid: ChangeSetGuid,
        /// Configured timeout in milliseconds.
        timeout_ms: u128,
    },
}

impl PublishPipelineError {
    /// Returns whether the attempt may succeed if retried.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Publisher(PublisherError::Rejected(_)) => false,
            Self::Repository(ChangeSetRepositoryError::Persistence(_))
            | Self::Publisher(PublisherError::Transient(_))
            | Self::Messaging(_)
            | Self::Timeout { .. } => true,
            Self::Repository(_) => false,
        }
    }
}

/// Single publish attempt for one trigger.
///
/// Holds no per-GUID exclusion; callers guarantee one in-flight attempt per
/// change set.
pub struct PublishPipeline<R, P, E, C>
where
    R: ChangeSetLoader,
    P: Publisher,
    E: CompletionEventSink,
    C: Clock + Send + Sync,
{
    loader: Arc<R>,
    publisher: Arc<P>,
    events: Arc<E>,
    factory: ChangeSetEventFactory<C>,
    publish_timeout: Duration,
}

impl<R, P, E, C> PublishPipeline<R, P, E, C>
where
    R: ChangeSetLoader,
    P: Publisher,
    E: CompletionEventSink,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(
        loader: Arc<R>,
        publisher: Arc<P>,
        events: Arc<E>,
        factory: ChangeSetEventFactory<C>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            loader,
            publisher,
            events,
            factory,
            publish_timeout,
        }
    }

    /// Runs one attempt and returns the emitted completion event.
    ///
    /// A summary reporting partial failure still completes the pipeline;
    /// the event carries `success = false` and the itemized errors.
    ///
    /// # Errors
    ///
    /// Returns [`PublishPipelineError::NotFound`] when the change set does not
    /// exist, or the failure of the loader, publisher, or event sink.
    pub async fn process(
        &self,
        trigger: &PublishTrigger,
    ) -> Result<ChangeSetCompletionEvent, PublishPipelineError> {
        let guid = trigger.change_set_guid;
        let change_set = self
            .loader
            .load(guid)
            .await?
            .ok_or(PublishPipelineError::NotFound(guid))?;

        let summary = tokio::time::timeout(self.publish_timeout, self.publisher.publish(guid))
            .await
            .map_err(|_| PublishPipelineError::Timeout {
                guid,
                timeout_ms: self.publish_timeout.as_millis(),
            })??;
        debug!(change_set = %guid, success = summary.is_success(), "publisher returned");

        let event = self.factory.published(trigger, &change_set, &summary);
        self.events.emit(&event).await?;
        Ok(event)
    }
}
