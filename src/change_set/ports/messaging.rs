//! Messaging ports: completion events, dead letters, and publish triggers.
//!
//! Destination names are deployment configuration; adapters decide where
//! each message lands.

use crate::change_set::domain::{ChangeSetCompletionEvent, DeadLetter, PublishTrigger};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for messaging operations.
pub type MessagingResult<T> = Result<T, MessagingError>;

/// Normal result destination for completion events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionEventSink: Send + Sync {
    /// Emits a completion or failure event.
    async fn emit(&self, event: &ChangeSetCompletionEvent) -> MessagingResult<()>;
}

/// Dead-letter destination for triggers that could not be processed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Forwards the original trigger for inspection or manual replay.
    async fn forward(&self, dead_letter: &DeadLetter) -> MessagingResult<()>;
}

/// Inbound queue feeding the publish pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublishTriggerSink: Send + Sync {
    /// Enqueues a publish trigger.
    async fn enqueue(&self, trigger: &PublishTrigger) -> MessagingResult<()>;
}

/// Errors returned by messaging adapters.
#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    /// The destination is closed and will not accept further messages.
    #[error("destination '{0}' is closed")]
    Closed(String),

    /// Transport-layer failure.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl MessagingError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
