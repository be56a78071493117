//! Given steps for change set publishing BDD scenarios.

use super::world::{PublishWorld, run_async};
use changeset_sync::change_set::{
    domain::{
        BusinessObjectDescriptor, ChangeSetGuid, MemberMetadata, PublishSummary, PublishTrigger,
        SyncResult, UserGuid,
    },
    ports::{PublishTriggerSink, PublisherError},
    services::CreateChangeSetRequest,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn product(identifier: &str) -> Result<BusinessObjectDescriptor, eyre::Report> {
    BusinessObjectDescriptor::new("Product", identifier).wrap_err("build product descriptor")
}

#[given(r#"an open change set "{name}" created by "{creator}""#)]
fn open_change_set(
    world: &mut PublishWorld,
    name: String,
    creator: String,
) -> Result<(), eyre::Report> {
    let request = CreateChangeSetRequest::new(name, UserGuid::new(creator)?);
    let created = run_async(world.management.create(request)).wrap_err("create change set")?;
    world.change_set = Some(created);
    Ok(())
}

#[given(r#"the change set contains product "{identifier}""#)]
fn change_set_contains_product(
    world: &mut PublishWorld,
    identifier: String,
) -> Result<(), eyre::Report> {
    let guid = world.current()?.guid();
    let updated = run_async(world.membership.add_object(
        guid,
        product(&identifier)?,
        MemberMetadata::new(),
    ))
    .wrap_err("add product to change set")?;
    world.change_set = Some(updated);
    Ok(())
}

#[given("the publisher will synchronize every object")]
fn publisher_synchronizes_everything(world: &mut PublishWorld) -> Result<(), eyre::Report> {
    let results = world
        .current()?
        .members()
        .map(|member| SyncResult::success(member.descriptor().clone()))
        .collect();
    world
        .publisher
        .push_outcome(Ok(PublishSummary::from_results(results)))?;
    Ok(())
}

#[given(r#"the publisher will fail product "{identifier}" with "{detail}""#)]
fn publisher_fails_product(
    world: &mut PublishWorld,
    identifier: String,
    detail: String,
) -> Result<(), eyre::Report> {
    let failing = product(&identifier)?;
    let results = world
        .current()?
        .members()
        .map(|member| {
            if member.descriptor() == &failing {
                SyncResult::error(failing.clone(), detail.clone())
            } else {
                SyncResult::success(member.descriptor().clone())
            }
        })
        .collect();
    world
        .publisher
        .push_outcome(Ok(PublishSummary::from_results(results)))?;
    Ok(())
}

#[given(r#"the publisher rejects the change set with "{reason}""#)]
fn publisher_rejects(world: &mut PublishWorld, reason: String) -> Result<(), eyre::Report> {
    world
        .publisher
        .push_outcome(Err(PublisherError::Rejected(reason)))?;
    Ok(())
}

#[given("a publish trigger for an unknown change set")]
fn trigger_for_unknown_change_set(world: &mut PublishWorld) -> Result<(), eyre::Report> {
    let trigger = PublishTrigger::new(ChangeSetGuid::new());
    run_async(world.queue.enqueue(&trigger)).wrap_err("enqueue trigger")?;
    world.last_trigger = Some(trigger);
    Ok(())
}
