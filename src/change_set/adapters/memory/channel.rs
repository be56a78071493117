//! In-memory messaging adapters.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::change_set::{
    domain::{ChangeSetCompletionEvent, DeadLetter, PublishTrigger},
    ports::{
        CompletionEventSink, DeadLetterSink, MessagingError, MessagingResult, PublishTriggerSink,
    },
};

/// Records completion events and dead letters in memory.
///
/// Each destination can be made to fail independently to exercise
/// failure handling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventChannel {
    state: Arc<RwLock<InMemoryChannelState>>,
}

#[derive(Debug, Default)]
struct InMemoryChannelState {
    events: Vec<ChangeSetCompletionEvent>,
    dead_letters: Vec<DeadLetter>,
    events_failing: bool,
    dead_letters_failing: bool,
}

fn lock_error(err: impl ToString) -> MessagingError {
    MessagingError::transport(std::io::Error::other(err.to_string()))
}

fn unavailable(destination: &str) -> MessagingError {
    MessagingError::transport(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        format!("{destination} unavailable"),
    ))
}

impl InMemoryEventChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every emitted completion event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn events(&self) -> MessagingResult<Vec<ChangeSetCompletionEvent>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.events.clone())
    }

    /// Returns every dead-lettered trigger, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn dead_letters(&self) -> MessagingResult<Vec<DeadLetter>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.dead_letters.clone())
    }

    /// Makes the event destination reject messages.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_events_failing(&self, failing: bool) -> MessagingResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.events_failing = failing;
        Ok(())
    }

    /// Makes the dead-letter destination reject messages.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_dead_letters_failing(&self, failing: bool) -> MessagingResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.dead_letters_failing = failing;
        Ok(())
    }
}

#[async_trait]
impl CompletionEventSink for InMemoryEventChannel {
    async fn emit(&self, event: &ChangeSetCompletionEvent) -> MessagingResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.events_failing {
            return Err(unavailable("event destination"));
        }
        state.events.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryEventChannel {
    async fn forward(&self, dead_letter: &DeadLetter) -> MessagingResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.dead_letters_failing {
            return Err(unavailable("dead-letter destination"));
        }
        state.dead_letters.push(dead_letter.clone());
        Ok(())
    }
}

/// Publish trigger queue backed by a `tokio` channel.
#[derive(Debug, Clone)]
pub struct ChannelTriggerQueue {
    name: String,
    sender: mpsc::Sender<PublishTrigger>,
}

impl ChannelTriggerQueue {
    /// Creates a bounded queue and returns it with its receiving end.
    #[must_use]
    pub fn bounded(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<PublishTrigger>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                name: name.into(),
                sender,
            },
            receiver,
        )
    }
}

#[async_trait]
impl PublishTriggerSink for ChannelTriggerQueue {
    async fn enqueue(&self, trigger: &PublishTrigger) -> MessagingResult<()> {
        self.sender
            .send(trigger.clone())
            .await
            .map_err(|_| MessagingError::Closed(self.name.clone()))
    }
}
