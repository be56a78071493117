//! Then steps for change set publishing BDD scenarios.

use super::world::{PublishWorld, run_async};
use changeset_sync::change_set::{
    domain::{
        BusinessObjectDescriptor, ChangeSet, ChangeSetCompletionEvent, ChangeSetState, UserGuid,
    },
    services::CreateChangeSetRequest,
};
use rstest_bdd_macros::then;

fn only_event(world: &PublishWorld) -> Result<ChangeSetCompletionEvent, eyre::Report> {
    let mut events = world.channel.events()?;
    if events.len() != 1 {
        return Err(eyre::eyre!("expected one event, found {}", events.len()));
    }
    events
        .pop()
        .ok_or_else(|| eyre::eyre!("missing completion event"))
}

#[then(r#"a "{event_type}" event reports success "{success}""#)]
fn event_reports(
    world: &PublishWorld,
    event_type: String,
    success: String,
) -> Result<(), eyre::Report> {
    let event = only_event(world)?;
    let wire = serde_json::to_value(&event)?;
    if wire["eventType"] != event_type.as_str() {
        return Err(eyre::eyre!("expected {event_type}, found {}", wire["eventType"]));
    }
    let expected: bool = success.parse()?;
    if event.success != expected {
        return Err(eyre::eyre!("expected success = {expected}, found {}", event.success));
    }
    Ok(())
}

#[then("the event lists {successes:usize} synchronized objects and {errors:usize} errors")]
fn event_lists(world: &PublishWorld, successes: usize, errors: usize) -> Result<(), eyre::Report> {
    let event = only_event(world)?;
    if event.sync_success_results.len() != successes || event.sync_error_results.len() != errors {
        return Err(eyre::eyre!(
            "expected {successes}/{errors}, found {}/{}",
            event.sync_success_results.len(),
            event.sync_error_results.len()
        ));
    }
    Ok(())
}

#[then(r#"the change set state is "{state}""#)]
fn change_set_state_is(world: &PublishWorld, state: String) -> Result<(), eyre::Report> {
    let expected = ChangeSetState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let guid = world.current()?.guid();
    let stored = run_async(world.management.get(guid))?
        .ok_or_else(|| eyre::eyre!("change set {guid} not found"))?;
    if stored.state() != expected {
        return Err(eyre::eyre!("expected state {expected}, found {}", stored.state()));
    }
    Ok(())
}

#[then("no trigger is dead-lettered")]
fn no_dead_letters(world: &PublishWorld) -> Result<(), eyre::Report> {
    let letters = world.channel.dead_letters()?;
    if !letters.is_empty() {
        return Err(eyre::eyre!("unexpected dead letters: {letters:?}"));
    }
    Ok(())
}

#[then("the trigger is dead-lettered")]
fn trigger_dead_lettered(world: &PublishWorld) -> Result<(), eyre::Report> {
    let trigger = world
        .last_trigger
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing trigger in scenario world"))?;
    let letters = world.channel.dead_letters()?;
    if !letters.iter().any(|letter| &letter.message == trigger) {
        return Err(eyre::eyre!("trigger not dead-lettered: {letters:?}"));
    }
    Ok(())
}

#[then("the publisher was never called")]
fn publisher_never_called(world: &PublishWorld) -> Result<(), eyre::Report> {
    let calls = world.publisher.calls()?;
    if !calls.is_empty() {
        return Err(eyre::eyre!("publisher was called for {calls:?}"));
    }
    Ok(())
}

#[then(r#"product "{identifier}" is available to a new change set"#)]
fn product_available(world: &PublishWorld, identifier: String) -> Result<(), eyre::Report> {
    let descriptor = BusinessObjectDescriptor::new("Product", identifier)?;
    let fresh: ChangeSet = run_async(
        world
            .management
            .create(CreateChangeSetRequest::new("Follow-up", UserGuid::new("carol")?)),
    )?;
    let status = run_async(world.membership.resolver().status(&descriptor));
    if !status.is_available(fresh.guid()) {
        return Err(eyre::eyre!("{descriptor} is still claimed"));
    }
    Ok(())
}
