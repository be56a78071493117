//! Integration tests for trigger consumption ordering and concurrency.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::helpers::{Deployment, deployment};
use async_trait::async_trait;
use changeset_sync::change_set::{
    adapters::memory::ChannelTriggerQueue,
    config::PublishConfig,
    domain::{
        ChangeSetCompletionEvent, ChangeSetEventType, ChangeSetGuid, PublishSummary,
        PublishTrigger, UserGuid, UserMetadata,
    },
    ports::PublishTriggerSink,
    services::publish::{PublishConsumer, PublishHandler, PublishOutcome},
};
use eyre::ensure;
use rstest::rstest;

#[derive(Default)]
struct Observations {
    running: HashMap<ChangeSetGuid, usize>,
    concurrent: usize,
    peak_concurrent: usize,
    overlapping_same_guid: bool,
    order: Vec<(ChangeSetGuid, String)>,
}

/// Handler that records overlap and order instead of publishing.
struct RecordingHandler {
    observed: Arc<Mutex<Observations>>,
    delay: Duration,
}

impl RecordingHandler {
    fn enter(&self, guid: ChangeSetGuid, tag: String) {
        let mut observed = self.observed.lock().expect("observations lock");
        let running = observed.running.entry(guid).or_default();
        *running += 1;
        let overlapped = *running > 1;
        observed.overlapping_same_guid |= overlapped;
        observed.concurrent += 1;
        observed.peak_concurrent = observed.peak_concurrent.max(observed.concurrent);
        observed.order.push((guid, tag));
    }

    fn leave(&self, guid: ChangeSetGuid) {
        let mut observed = self.observed.lock().expect("observations lock");
        if let Some(running) = observed.running.get_mut(&guid) {
            *running -= 1;
        }
        observed.concurrent -= 1;
    }
}

#[async_trait]
impl PublishHandler for RecordingHandler {
    async fn handle(&self, trigger: PublishTrigger) -> PublishOutcome {
        let guid = trigger.change_set_guid;
        let tag = trigger
            .properties
            .initiator
            .as_ref()
            .map(|initiator| initiator.user_guid.as_str().to_owned())
            .unwrap_or_default();
        self.enter(guid, tag);
        tokio::time::sleep(self.delay).await;
        self.leave(guid);
        let summary = PublishSummary::from_results(Vec::new());
        PublishOutcome::Published {
            event: ChangeSetCompletionEvent {
                event_type: ChangeSetEventType::ChangeSetPublished,
                guid,
                name: None,
                creator_metadata: None,
                publish_initiator_metadata: None,
                success: summary.is_success(),
                publish_summary: summary.summary().to_owned(),
                sync_success_results: Vec::new(),
                sync_error_results: Vec::new(),
                occurred_at: chrono::Utc::now(),
            },
            attempts: 1,
        }
    }
}

fn tagged(guid: ChangeSetGuid, tag: &str) -> PublishTrigger {
    PublishTrigger::new(guid)
        .with_initiator(UserMetadata::new(UserGuid::new(tag).expect("valid user guid")))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn triggers_for_one_change_set_run_in_arrival_order() -> eyre::Result<()> {
    let observed = Arc::new(Mutex::new(Observations::default()));
    let handler = RecordingHandler {
        observed: Arc::clone(&observed),
        delay: Duration::from_millis(10),
    };
    let (queue, receiver) = ChannelTriggerQueue::bounded("changeset.publish", 16);
    let busy = ChangeSetGuid::new();
    let other = ChangeSetGuid::new();
    for (guid, tag) in [(busy, "first"), (other, "solo"), (busy, "second"), (busy, "third")] {
        queue.enqueue(&tagged(guid, tag)).await?;
    }
    drop(queue);

    let report = PublishConsumer::new(Arc::new(handler), 4).run(receiver).await;

    ensure!(report.published == 4, "all triggers should be handled: {report:?}");
    let observed = observed.lock().map_err(|err| eyre::eyre!("observations lock: {err}"))?;
    ensure!(!observed.overlapping_same_guid, "one change set must never run twice at once");
    let busy_order: Vec<&str> = observed
        .order
        .iter()
        .filter(|(guid, _)| *guid == busy)
        .map(|(_, tag)| tag.as_str())
        .collect();
    ensure!(
        busy_order == ["first", "second", "third"],
        "arrival order lost: {busy_order:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn distinct_change_sets_respect_the_concurrency_bound() -> eyre::Result<()> {
    let observed = Arc::new(Mutex::new(Observations::default()));
    let handler = RecordingHandler {
        observed: Arc::clone(&observed),
        delay: Duration::from_millis(20),
    };
    let (queue, receiver) = ChannelTriggerQueue::bounded("changeset.publish", 16);
    for _ in 0..8 {
        queue.enqueue(&PublishTrigger::new(ChangeSetGuid::new())).await?;
    }
    drop(queue);

    let report = PublishConsumer::new(Arc::new(handler), 3).run(receiver).await;

    ensure!(report.handled() == 8, "all triggers should be handled: {report:?}");
    let observed = observed.lock().map_err(|err| eyre::eyre!("observations lock: {err}"))?;
    ensure!(
        observed.peak_concurrent <= 3,
        "concurrency bound exceeded: {}",
        observed.peak_concurrent
    );
    ensure!(observed.peak_concurrent > 1, "distinct change sets should run concurrently");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn consumer_reports_failed_triggers(deployment: Deployment) -> eyre::Result<()> {
    let (queue, direct) = ChannelTriggerQueue::bounded("direct", 4);
    let missing = ChangeSetGuid::new();
    queue.enqueue(&PublishTrigger::new(missing)).await?;
    drop(queue);

    let handler = deployment.handler(&PublishConfig::immediate(0));
    let report = PublishConsumer::new(Arc::new(handler), 2).run(direct).await;

    ensure!(report.failed == vec![missing], "missing change set should fail: {report:?}");
    ensure!(deployment.channel.dead_letters()?.len() == 1, "trigger should be dead-lettered");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn redelivered_triggers_for_a_busy_change_set_are_coalesced() -> eyre::Result<()> {
    let observed = Arc::new(Mutex::new(Observations::default()));
    let handler = RecordingHandler {
        observed: Arc::clone(&observed),
        delay: Duration::from_millis(50),
    };
    let (queue, receiver) = ChannelTriggerQueue::bounded("changeset.publish", 64);
    let busy = ChangeSetGuid::new();
    for _ in 0..20 {
        queue.enqueue(&tagged(busy, "redelivered")).await?;
    }
    queue.enqueue(&tagged(busy, "follow-up")).await?;
    drop(queue);

    let report = PublishConsumer::new(Arc::new(handler), 4).run(receiver).await;

    ensure!(
        report.published == 3,
        "expected the running attempt, one waiting duplicate, and the follow-up: {report:?}"
    );
    ensure!(report.coalesced == 18, "duplicates should be dropped: {report:?}");
    let observed = observed.lock().map_err(|err| eyre::eyre!("observations lock: {err}"))?;
    let tags: Vec<&str> = observed.order.iter().map(|(_, tag)| tag.as_str()).collect();
    ensure!(
        tags == ["redelivered", "redelivered", "follow-up"],
        "arrival order lost: {tags:?}"
    );
    Ok(())
}
