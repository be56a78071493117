//! Trigger consumer with bounded concurrency and per-change-set ordering.

use super::error_policy::{PublishHandler, PublishOutcome};
use crate::change_set::domain::{ChangeSetGuid, PublishTrigger};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info};

/// Counts of trigger outcomes observed by a consumer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Triggers whose pipeline completed.
    pub published: usize,
    /// Triggers abandoned after compensation, in completion order.
    pub failed: Vec<ChangeSetGuid>,
    /// Handler tasks that panicked.
    pub panicked: usize,
    /// Triggers dropped because an identical trigger was already waiting.
    pub coalesced: usize,
}

impl ConsumerReport {
    /// Returns the number of triggers handled.
    #[must_use]
    pub fn handled(&self) -> usize {
        self.published
            .saturating_add(self.failed.len())
            .saturating_add(self.panicked)
    }

    fn record(&mut self, outcome: &PublishOutcome) {
        match outcome {
            PublishOutcome::Published { .. } => self.published = self.published.saturating_add(1),
            PublishOutcome::Failed(report) => self.failed.push(report.guid),
        }
    }
}

/// Drains publish triggers from a queue.
///
/// Distinct change sets run concurrently up to `max_concurrency`. Triggers
/// for a change set already in flight wait and run in arrival order once
/// the earlier attempt finishes, so one change set never has two attempts
/// running at once. Waiting triggers count against `max_concurrency`, and a
/// trigger identical to one already waiting is dropped.
pub struct PublishConsumer {
    handler: Arc<dyn PublishHandler>,
    max_concurrency: usize,
}

#[derive(Default)]
struct Dispatch {
    tasks: JoinSet<PublishOutcome>,
    running: HashMap<Id, ChangeSetGuid>,
    in_flight: HashSet<ChangeSetGuid>,
    deferred: HashMap<ChangeSetGuid, VecDeque<PublishTrigger>>,
    deferred_len: usize,
}

enum Submitted {
    Spawned,
    Deferred,
    Coalesced,
}

impl Dispatch {
    fn pending(&self) -> usize {
        self.tasks.len().saturating_add(self.deferred_len)
    }

    fn submit(&mut self, handler: &Arc<dyn PublishHandler>, trigger: PublishTrigger) -> Submitted {
        let guid = trigger.change_set_guid;
        if !self.in_flight.contains(&guid) {
            self.spawn(handler, trigger);
            return Submitted::Spawned;
        }
        let waiting = self.deferred.entry(guid).or_default();
        if waiting.contains(&trigger) {
            debug!(change_set = %guid, "identical trigger already waiting; dropping duplicate");
            return Submitted::Coalesced;
        }
        debug!(change_set = %guid, "publish already in flight; deferring trigger");
        waiting.push_back(trigger);
        self.deferred_len = self.deferred_len.saturating_add(1);
        Submitted::Deferred
    }

    fn spawn(&mut self, handler: &Arc<dyn PublishHandler>, trigger: PublishTrigger) {
        let guid = trigger.change_set_guid;
        let task_handler = Arc::clone(handler);
        let abort = self
            .tasks
            .spawn(async move { task_handler.handle(trigger).await });
        self.running.insert(abort.id(), guid);
        self.in_flight.insert(guid);
    }

    fn release(&mut self, handler: &Arc<dyn PublishHandler>, id: Id) {
        let Some(guid) = self.running.remove(&id) else {
            return;
        };
        self.in_flight.remove(&guid);
        let next = self.deferred.get_mut(&guid).and_then(VecDeque::pop_front);
        if self.deferred.get(&guid).is_some_and(VecDeque::is_empty) {
            self.deferred.remove(&guid);
        }
        if let Some(trigger) = next {
            self.deferred_len = self.deferred_len.saturating_sub(1);
            self.spawn(handler, trigger);
        }
    }
}

impl PublishConsumer {
    /// Creates a consumer; `max_concurrency` is raised to at least one.
    #[must_use]
    pub fn new(handler: Arc<dyn PublishHandler>, max_concurrency: usize) -> Self {
        Self {
            handler,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Consumes triggers until `receiver` closes and every accepted trigger
    /// has been handled.
    pub async fn run(self, mut receiver: mpsc::Receiver<PublishTrigger>) -> ConsumerReport {
        let mut dispatch = Dispatch::default();
        let mut report = ConsumerReport::default();
        let mut open = true;

        loop {
            let accepting = open && dispatch.pending() < self.max_concurrency;
            if !accepting && dispatch.tasks.is_empty() {
                break;
            }
            tokio::select! {
                received = receiver.recv(), if accepting => match received {
                    Some(trigger) => {
                        if matches!(dispatch.submit(&self.handler, trigger), Submitted::Coalesced) {
                            report.coalesced = report.coalesced.saturating_add(1);
                        }
                    }
                    None => open = false,
                },
                Some(joined) = dispatch.tasks.join_next_with_id(), if !dispatch.tasks.is_empty() => {
                    match joined {
                        Ok((id, outcome)) => {
                            report.record(&outcome);
                            dispatch.release(&self.handler, id);
                        }
                        Err(err) => {
                            let id = err.id();
                            let guid = dispatch.running.get(&id).copied();
                            error!(change_set = ?guid, error = %err, "publish handler task failed");
                            report.panicked = report.panicked.saturating_add(1);
                            dispatch.release(&self.handler, id);
                        }
                    }
                }
            }
        }

        info!(
            published = report.published,
            failed = report.failed.len(),
            panicked = report.panicked,
            coalesced = report.coalesced,
            "publish consumer drained"
        );
        report
    }
}
