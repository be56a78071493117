//! Shared fixtures for in-memory change set integration tests.

use std::sync::Arc;

use changeset_sync::change_set::{
    adapters::memory::{
        ChannelTriggerQueue, InMemoryChangeSetRepository, InMemoryEventChannel, InMemoryPublisher,
    },
    config::PublishConfig,
    domain::{BusinessObjectDescriptor, PublishTrigger, UserGuid},
    services::{
        ChangeSetManagementService, ChangeSetMembershipService,
        publish::{PublishCollaborators, PublishErrorHandler},
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use tokio::sync::mpsc;

/// Management service wired to in-memory adapters.
pub type TestManagement =
    ChangeSetManagementService<InMemoryChangeSetRepository, ChannelTriggerQueue, DefaultClock>;

/// Membership service wired to in-memory adapters.
pub type TestMembership = ChangeSetMembershipService<InMemoryChangeSetRepository, DefaultClock>;

/// Publish handler wired to in-memory adapters.
pub type TestHandler = PublishErrorHandler<
    InMemoryChangeSetRepository,
    InMemoryPublisher,
    InMemoryEventChannel,
    InMemoryEventChannel,
    DefaultClock,
>;

/// Every service and adapter of one isolated deployment.
pub struct Deployment {
    pub repository: Arc<InMemoryChangeSetRepository>,
    pub publisher: Arc<InMemoryPublisher>,
    pub channel: Arc<InMemoryEventChannel>,
    pub management: TestManagement,
    pub membership: TestMembership,
    pub triggers: Option<mpsc::Receiver<PublishTrigger>>,
}

impl Deployment {
    /// Builds a publish handler sharing this deployment's adapters.
    #[must_use]
    pub fn handler(&self, config: &PublishConfig) -> TestHandler {
        PublishErrorHandler::new(
            PublishCollaborators {
                repository: Arc::clone(&self.repository),
                publisher: Arc::clone(&self.publisher),
                events: Arc::clone(&self.channel),
                dead_letters: Arc::clone(&self.channel),
                clock: Arc::new(DefaultClock),
            },
            config,
        )
    }
}

/// Provides a fresh deployment for each test.
#[fixture]
pub fn deployment() -> Deployment {
    let repository = Arc::new(InMemoryChangeSetRepository::new());
    let clock = Arc::new(DefaultClock);
    let (queue, triggers) = ChannelTriggerQueue::bounded("changeset.publish", 64);
    Deployment {
        management: ChangeSetManagementService::new(
            Arc::clone(&repository),
            Arc::new(queue),
            Arc::clone(&clock),
        ),
        membership: ChangeSetMembershipService::new(Arc::clone(&repository), clock),
        publisher: Arc::new(InMemoryPublisher::new()),
        channel: Arc::new(InMemoryEventChannel::new()),
        repository,
        triggers: Some(triggers),
    }
}

/// Builds a user identity.
///
/// # Panics
///
/// Panics if `value` is blank.
#[must_use]
pub fn user(value: &str) -> UserGuid {
    UserGuid::new(value).expect("valid user guid")
}

/// Builds a product descriptor.
///
/// # Panics
///
/// Panics if `identifier` is blank.
#[must_use]
pub fn product(identifier: &str) -> BusinessObjectDescriptor {
    BusinessObjectDescriptor::new("Product", identifier).expect("valid descriptor")
}
