//! Retry and compensation policy around the publish pipeline.
//!
//! Recoverable failures are retried under the configured [`RetryPolicy`]
//! without touching change set state. Once a failure is terminal the handler
//! compensates: it holds the change set LOCKED, emits a failure event, and
//! forwards the trigger to the dead-letter destination. A compensation step
//! that itself fails is logged and reported, never raised.

use super::{
    events::ChangeSetEventFactory,
    pipeline::{PublishPipeline, PublishPipelineError},
};
use crate::change_set::{
    config::{PublishConfig, RetryPolicy},
    domain::{
        ChangeSet, ChangeSetCompletionEvent, ChangeSetGuid, ChangeSetState, DeadLetter,
        PublishTrigger,
    },
    ports::{
        ChangeSetLoader, ChangeSetStateUpdater, CompletionEventSink, DeadLetterSink, Publisher,
    },
    services::state::{ChangeSetStateMachine, TransitionOutcome},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

const COMPENSATION_TARGET: &str = "changeset_sync::compensation";

/// Handles one publish trigger to a final outcome.
#[async_trait]
pub trait PublishHandler: Send + Sync {
    /// Processes `trigger`, retrying and compensating as configured.
    async fn handle(&self, trigger: PublishTrigger) -> PublishOutcome;
}

/// Final outcome of handling one trigger.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    /// The pipeline completed and the completion event was emitted.
    ///
    /// The event may still report item-level failures.
    Published {
        /// Emitted completion event.
        event: ChangeSetCompletionEvent,
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// The trigger was abandoned and compensated.
    Failed(FailureReport),
}

impl PublishOutcome {
    /// Returns the change set GUID the outcome refers to.
    #[must_use]
    pub const fn guid(&self) -> ChangeSetGuid {
        match self {
            Self::Published { event, .. } => event.guid,
            Self::Failed(report) => report.guid,
        }
    }
}

/// Why a failure was treated as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The failure cannot succeed on retry.
    NonRecoverable,
    /// The failure was recoverable but the retry budget ran out.
    RetriesExhausted,
}

/// Details of an abandoned trigger.
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// Change set identifier.
    pub guid: ChangeSetGuid,
    /// Failure of the last attempt.
    pub cause: PublishPipelineError,
    /// Classification of the failure.
    pub class: FailureClass,
    /// Attempts made.
    pub attempts: u32,
    /// Result of each compensation step.
    pub compensation: CompensationReport,
}

/// Result of one compensation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationStep {
    /// The step ran and succeeded.
    Completed,
    /// The step did not apply.
    Skipped(&'static str),
    /// The step ran and failed; the message is logged.
    Failed(String),
}

impl CompensationStep {
    /// Returns whether the step failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of each compensation step, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationReport {
    /// Holding the change set in LOCKED.
    pub lock: CompensationStep,
    /// Emitting the failure event.
    pub failure_event: CompensationStep,
    /// Forwarding the trigger to the dead-letter destination.
    pub dead_letter: CompensationStep,
}

impl CompensationReport {
    /// Returns whether every step completed or was skipped.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !(self.lock.is_failed() || self.failure_event.is_failed() || self.dead_letter.is_failed())
    }
}

/// Collaborators required by [`PublishErrorHandler`].
pub struct PublishCollaborators<R, P, E, D, C> {
    /// Loads change sets and persists compensating state changes.
    pub repository: Arc<R>,
    /// External system of record.
    pub publisher: Arc<P>,
    /// Normal result destination.
    pub events: Arc<E>,
    /// Dead-letter destination.
    pub dead_letters: Arc<D>,
    /// Time source.
    pub clock: Arc<C>,
}

/// Retries recoverable failures and compensates terminal ones.
pub struct PublishErrorHandler<R, P, E, D, C>
where
    R: ChangeSetLoader + ChangeSetStateUpdater,
    P: Publisher,
    E: CompletionEventSink,
    D: DeadLetterSink,
    C: Clock + Send + Sync,
{
    pipeline: PublishPipeline<R, P, E, C>,
    state_machine: ChangeSetStateMachine<R, C>,
    repository: Arc<R>,
    events: Arc<E>,
    dead_letters: Arc<D>,
    factory: ChangeSetEventFactory<C>,
    clock: Arc<C>,
    retry: RetryPolicy,
    result_destination: String,
    dead_letter_destination: String,
}

impl<R, P, E, D, C> PublishErrorHandler<R, P, E, D, C>
where
    R: ChangeSetLoader + ChangeSetStateUpdater,
    P: Publisher,
    E: CompletionEventSink,
    D: DeadLetterSink,
    C: Clock + Send + Sync,
{
    /// Wires a handler and its pipeline from `collaborators` and `config`.
    #[must_use]
    pub fn new(collaborators: PublishCollaborators<R, P, E, D, C>, config: &PublishConfig) -> Self {
        let PublishCollaborators {
            repository,
            publisher,
            events,
            dead_letters,
            clock,
        } = collaborators;
        Self {
            pipeline: PublishPipeline::new(
                Arc::clone(&repository),
                publisher,
                Arc::clone(&events),
                ChangeSetEventFactory::new(Arc::clone(&clock)),
                config.publish_timeout(),
            ),
            state_machine: ChangeSetStateMachine::new(Arc::clone(&repository), Arc::clone(&clock)),
            repository,
            events,
            dead_letters,
            factory: ChangeSetEventFactory::new(Arc::clone(&clock)),
            clock,
            retry: config.retry,
            result_destination: config.result_destination.clone(),
            dead_letter_destination: config.dead_letter_destination.clone(),
        }
    }

    async fn run(&self, trigger: PublishTrigger) -> PublishOutcome {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            let cause = match self.pipeline.process(&trigger).await {
                Ok(event) => {
                    info!(
                        attempts,
                        success = event.success,
                        destination = %self.result_destination,
                        "publish completed"
                    );
                    return PublishOutcome::Published { event, attempts };
                }
                Err(cause) => cause,
            };

            let class = if !cause.is_recoverable() {
                FailureClass::NonRecoverable
            } else if let Some(delay) = self.retry.next_delay(attempts) {
                warn!(attempts, error = %cause, delay_ms = delay.as_millis(), "publish attempt failed; retrying");
                tokio::time::sleep(delay).await;
                continue;
            } else {
                FailureClass::RetriesExhausted
            };

            error!(attempts, error = %cause, ?class, "publish failed");
            let compensation = self.compensate(&trigger, &cause, attempts).await;
            return PublishOutcome::Failed(FailureReport {
                guid: trigger.change_set_guid,
                cause,
                class,
                attempts,
                compensation,
            });
        }
    }

    async fn compensate(
        &self,
        trigger: &PublishTrigger,
        cause: &PublishPipelineError,
        attempts: u32,
    ) -> CompensationReport {
        let (lock, change_set) = self.hold_lock(trigger.change_set_guid, cause).await;
        let reason = cause.to_string();

        let event = self.factory.failed(trigger, change_set.as_ref(), &reason);
        let failure_event = match self.events.emit(&event).await {
            Ok(()) => CompensationStep::Completed,
            Err(err) => {
                error!(
                    target: COMPENSATION_TARGET,
                    destination = %self.result_destination,
                    error = %err,
                    "failed to emit failure event"
                );
                CompensationStep::Failed(err.to_string())
            }
        };

        let letter = DeadLetter {
            message: trigger.clone(),
            reason,
            attempts,
            failed_at: self.clock.utc(),
        };
        let dead_letter = match self.dead_letters.forward(&letter).await {
            Ok(()) => {
                info!(destination = %self.dead_letter_destination, "trigger dead-lettered");
                CompensationStep::Completed
            }
            Err(err) => {
                error!(
                    target: COMPENSATION_TARGET,
                    destination = %self.dead_letter_destination,
                    error = %err,
                    "failed to forward trigger to dead-letter destination"
                );
                CompensationStep::Failed(err.to_string())
            }
        };

        CompensationReport {
            lock,
            failure_event,
            dead_letter,
        }
    }

    async fn hold_lock(
        &self,
        guid: ChangeSetGuid,
        cause: &PublishPipelineError,
    ) -> (CompensationStep, Option<ChangeSet>) {
        if matches!(cause, PublishPipelineError::NotFound(_)) {
            return (CompensationStep::Skipped("change set not found"), None);
        }
        let mut change_set = match self.repository.load(guid).await {
            Ok(Some(change_set)) => change_set,
            Ok(None) => return (CompensationStep::Skipped("change set not found"), None),
            Err(err) => {
                error!(target: COMPENSATION_TARGET, error = %err, "failed to load change set for compensation");
                return (CompensationStep::Failed(err.to_string()), None);
            }
        };
        if change_set.state() == ChangeSetState::Finalized {
            return (
                CompensationStep::Skipped("change set is finalized"),
                Some(change_set),
            );
        }
        let step = match self
            .state_machine
            .transition(&mut change_set, ChangeSetState::Locked)
            .await
        {
            Ok(TransitionOutcome::Changed { .. }) => CompensationStep::Completed,
            Ok(TransitionOutcome::Unchanged(_)) => CompensationStep::Skipped("already locked"),
            Err(err) => {
                error!(target: COMPENSATION_TARGET, error = %err, "failed to hold change set locked");
                CompensationStep::Failed(err.to_string())
            }
        };
        (step, Some(change_set))
    }
}

#[async_trait]
impl<R, P, E, D, C> PublishHandler for PublishErrorHandler<R, P, E, D, C>
where
    R: ChangeSetLoader + ChangeSetStateUpdater,
    P: Publisher,
    E: CompletionEventSink,
    D: DeadLetterSink,
    C: Clock + Send + Sync,
{
    async fn handle(&self, trigger: PublishTrigger) -> PublishOutcome {
        let span = info_span!("publish", change_set = %trigger.change_set_guid);
        self.run(trigger).instrument(span).await
    }
}
