//! In-memory integration tests for the request-to-result publish flow.

use std::sync::Arc;

use super::helpers::{Deployment, deployment, product, user};
use changeset_sync::change_set::{
    config::PublishConfig,
    domain::{
        ChangeSetCompletionEvent, ChangeSetEventType, ChangeSetState, MemberMetadata,
        PublishSummary, SyncResult,
    },
    ports::PublisherError,
    services::{CreateChangeSetRequest, publish::PublishConsumer},
};
use eyre::{bail, ensure};
use rstest::rstest;
use serde_json::Value;

async fn drain(deployment: &mut Deployment, config: &PublishConfig) -> eyre::Result<usize> {
    let mut triggers = deployment
        .triggers
        .take()
        .ok_or_else(|| eyre::eyre!("trigger receiver already taken"))?;
    triggers.close();
    let consumer = PublishConsumer::new(Arc::new(deployment.handler(config)), config.max_concurrency);
    Ok(consumer.run(triggers).await.handled())
}

fn only_event(events: &[ChangeSetCompletionEvent]) -> eyre::Result<&ChangeSetCompletionEvent> {
    let [event] = events else {
        bail!("expected one event, found {}", events.len());
    };
    Ok(event)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn requested_publish_reports_completion_event(mut deployment: Deployment) -> eyre::Result<()> {
    let created = deployment
        .management
        .create(CreateChangeSetRequest::new("Catalogue", user("alice")))
        .await?;
    deployment
        .membership
        .add_object(created.guid(), product("SKU-1"), MemberMetadata::new())
        .await?;
    deployment.publisher.push_outcome(Ok(PublishSummary::from_results(vec![
        SyncResult::success(product("SKU-1")),
    ])))?;
    deployment
        .management
        .request_publish(created.guid(), user("bob"))
        .await?;

    let handled = drain(&mut deployment, &PublishConfig::immediate(0)).await?;
    ensure!(handled == 1, "one trigger should be handled, got {handled}");

    let events = deployment.channel.events()?;
    let event = only_event(&events)?;
    ensure!(event.success, "publish should succeed");
    ensure!(
        event
            .publish_initiator_metadata
            .as_ref()
            .is_some_and(|initiator| initiator.user_guid == user("bob")),
        "initiator should be bob"
    );

    let wire: Value = serde_json::to_value(event)?;
    ensure!(wire["eventType"] == "CHANGE_SET_PUBLISHED", "wire event type: {wire}");
    ensure!(wire["creatorMetadata"]["userGuid"] == "alice", "wire creator: {wire}");
    ensure!(wire["syncSuccessResults"].as_array().map(Vec::len) == Some(1), "wire results: {wire}");

    let stored = deployment.management.get(created.guid()).await?;
    ensure!(
        stored.is_some_and(|change_set| change_set.state() == ChangeSetState::Locked),
        "change set stays locked until finalized"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_publish_is_quarantined(mut deployment: Deployment) -> eyre::Result<()> {
    let created = deployment
        .management
        .create(CreateChangeSetRequest::new("Broken", user("alice")))
        .await?;
    deployment
        .publisher
        .push_outcome(Err(PublisherError::Rejected("target offline for maintenance".to_owned())))?;
    let trigger = deployment
        .management
        .request_publish(created.guid(), user("alice"))
        .await?;

    drain(&mut deployment, &PublishConfig::immediate(3)).await?;

    let events = deployment.channel.events()?;
    let event = only_event(&events)?;
    ensure!(
        event.event_type == ChangeSetEventType::ChangeSetPublishFailed,
        "failure event expected"
    );
    ensure!(
        event.publish_summary.contains("target offline for maintenance"),
        "summary should carry the cause: {}",
        event.publish_summary
    );
    let letters = deployment.channel.dead_letters()?;
    ensure!(
        letters.iter().map(|letter| &letter.message).eq([&trigger]),
        "original trigger should be dead-lettered"
    );
    let stored = deployment.management.get(created.guid()).await?;
    ensure!(
        stored.is_some_and(|change_set| change_set.state() == ChangeSetState::Locked),
        "quarantined change set stays locked"
    );
    Ok(())
}
