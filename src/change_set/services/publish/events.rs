//! Builder for outbound completion events.

use crate::change_set::domain::{
    ChangeSet, ChangeSetCompletionEvent, ChangeSetEventType, PublishSummary, PublishTrigger,
    UserMetadata,
};
use mockable::Clock;
use std::sync::Arc;

/// Builds completion and failure events from triggers and change sets.
///
/// The change set name is taken from the loaded change set and falls back to
/// the name carried by the trigger. Creator metadata is the reverse: the
/// trigger's copy wins and the loaded change set's creator is the fallback.
/// The initiator only ever comes from the trigger.
#[derive(Clone)]
pub struct ChangeSetEventFactory<C>
where
    C: Clock + Send + Sync,
{
    clock: Arc<C>,
}

impl<C> ChangeSetEventFactory<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a factory stamping events with `clock`.
    #[must_use]
    pub const fn new(clock: Arc<C>) -> Self {
        Self { clock }
    }

    /// Builds the event for a publish that ran to completion.
    #[must_use]
    pub fn published(
        &self,
        trigger: &PublishTrigger,
        change_set: &ChangeSet,
        summary: &PublishSummary,
    ) -> ChangeSetCompletionEvent {
        let (sync_success_results, sync_error_results) = summary.partition();
        ChangeSetCompletionEvent {
            event_type: ChangeSetEventType::ChangeSetPublished,
            guid: trigger.change_set_guid,
            name: Some(change_set.name().to_owned()),
            creator_metadata: creator(trigger, Some(change_set)),
            publish_initiator_metadata: trigger.properties.initiator.clone(),
            success: summary.is_success(),
            publish_summary: summary.summary().to_owned(),
            sync_success_results,
            sync_error_results,
            occurred_at: self.clock.utc(),
        }
    }

    /// Builds the failure event emitted once a publish is abandoned.
    #[must_use]
    pub fn failed(
        &self,
        trigger: &PublishTrigger,
        change_set: Option<&ChangeSet>,
        reason: &str,
    ) -> ChangeSetCompletionEvent {
        let name = change_set
            .map(|loaded| loaded.name().to_owned())
            .or_else(|| trigger.properties.change_set_name.clone());
        ChangeSetCompletionEvent {
            event_type: ChangeSetEventType::ChangeSetPublishFailed,
            guid: trigger.change_set_guid,
            name,
            creator_metadata: creator(trigger, change_set),
            publish_initiator_metadata: trigger.properties.initiator.clone(),
            success: false,
            publish_summary: format!("Publish failed: {reason}"),
            sync_success_results: Vec::new(),
            sync_error_results: Vec::new(),
            occurred_at: self.clock.utc(),
        }
    }
}

fn creator(trigger: &PublishTrigger, change_set: Option<&ChangeSet>) -> Option<UserMetadata> {
    trigger.properties.creator.clone().or_else(|| {
        change_set.map(|loaded| UserMetadata::new(loaded.created_by().clone()))
    })
}
