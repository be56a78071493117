//! Scripted in-memory publisher.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::change_set::{
    domain::{ChangeSetGuid, PublishSummary},
    ports::{Publisher, PublisherError, PublisherResult},
};

/// Publisher that replays scripted outcomes without touching any environment.
///
/// Outcomes are consumed in order; once the script is exhausted every publish
/// succeeds with an empty summary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<Mutex<InMemoryPublisherState>>,
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    script: VecDeque<PublisherResult<PublishSummary>>,
    calls: Vec<ChangeSetGuid>,
}

fn lock_error(err: impl ToString) -> PublisherError {
    PublisherError::transient(std::io::Error::other(err.to_string()))
}

impl InMemoryPublisher {
    /// Creates a publisher with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome to the script.
    ///
    /// # Errors
    ///
    /// Returns a transient error when lock acquisition fails.
    pub fn push_outcome(&self, outcome: PublisherResult<PublishSummary>) -> PublisherResult<()> {
        let mut state = self.state.lock().map_err(lock_error)?;
        state.script.push_back(outcome);
        Ok(())
    }

    /// Returns the GUIDs passed to [`Publisher::publish`], in call order.
    ///
    /// # Errors
    ///
    /// Returns a transient error when lock acquisition fails.
    pub fn calls(&self) -> PublisherResult<Vec<ChangeSetGuid>> {
        let state = self.state.lock().map_err(lock_error)?;
        Ok(state.calls.clone())
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, guid: ChangeSetGuid) -> PublisherResult<PublishSummary> {
        let mut state = self.state.lock().map_err(lock_error)?;
        state.calls.push(guid);
        state
            .script
            .pop_front()
            .unwrap_or_else(|| Ok(PublishSummary::from_results(Vec::new())))
    }
}
