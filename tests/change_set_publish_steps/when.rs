//! When steps for change set publishing BDD scenarios.

use std::sync::Arc;

use super::world::{PublishWorld, run_async};
use changeset_sync::change_set::{domain::UserGuid, services::publish::PublishConsumer};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#""{initiator}" requests a publish"#)]
fn request_publish(world: &mut PublishWorld, initiator: String) -> Result<(), eyre::Report> {
    let guid = world.current()?.guid();
    let trigger = run_async(
        world
            .management
            .request_publish(guid, UserGuid::new(initiator)?),
    )
    .wrap_err("request publish")?;
    world.last_trigger = Some(trigger);
    Ok(())
}

#[when("the publish queue is drained")]
fn drain_queue(world: &mut PublishWorld) -> Result<(), eyre::Report> {
    let mut triggers = world
        .triggers
        .take()
        .ok_or_else(|| eyre::eyre!("publish queue already drained"))?;
    triggers.close();
    let consumer = PublishConsumer::new(Arc::new(world.handler()), 2);
    world.last_report = Some(run_async(consumer.run(triggers)));
    Ok(())
}

#[when("the change set is finalized")]
fn finalize(world: &mut PublishWorld) -> Result<(), eyre::Report> {
    let guid = world.current()?.guid();
    let finalized = run_async(world.management.finalize(guid)).wrap_err("finalize change set")?;
    world.change_set = Some(finalized);
    Ok(())
}
