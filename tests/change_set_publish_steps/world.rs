//! Shared world state for change set publishing BDD scenarios.

use std::sync::Arc;

use changeset_sync::change_set::{
    adapters::memory::{
        ChannelTriggerQueue, InMemoryChangeSetRepository, InMemoryEventChannel, InMemoryPublisher,
    },
    config::PublishConfig,
    domain::{ChangeSet, PublishTrigger},
    services::{
        ChangeSetManagementService, ChangeSetMembershipService,
        publish::{ConsumerReport, PublishCollaborators, PublishErrorHandler},
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use tokio::sync::mpsc;

/// Management service type used by the BDD world.
pub type TestManagement =
    ChangeSetManagementService<InMemoryChangeSetRepository, ChannelTriggerQueue, DefaultClock>;

/// Membership service type used by the BDD world.
pub type TestMembership = ChangeSetMembershipService<InMemoryChangeSetRepository, DefaultClock>;

/// Scenario world for publishing behaviour tests.
pub struct PublishWorld {
    pub repository: Arc<InMemoryChangeSetRepository>,
    pub publisher: Arc<InMemoryPublisher>,
    pub channel: Arc<InMemoryEventChannel>,
    pub queue: ChannelTriggerQueue,
    pub triggers: Option<mpsc::Receiver<PublishTrigger>>,
    pub management: TestManagement,
    pub membership: TestMembership,
    pub change_set: Option<ChangeSet>,
    pub last_trigger: Option<PublishTrigger>,
    pub last_report: Option<ConsumerReport>,
}

impl PublishWorld {
    /// Creates a world with empty adapters and no change set.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryChangeSetRepository::new());
        let clock = Arc::new(DefaultClock);
        let (queue, triggers) = ChannelTriggerQueue::bounded("changeset.publish", 16);
        Self {
            management: ChangeSetManagementService::new(
                Arc::clone(&repository),
                Arc::new(queue.clone()),
                Arc::clone(&clock),
            ),
            membership: ChangeSetMembershipService::new(Arc::clone(&repository), clock),
            repository,
            publisher: Arc::new(InMemoryPublisher::new()),
            channel: Arc::new(InMemoryEventChannel::new()),
            queue,
            triggers: Some(triggers),
            change_set: None,
            last_trigger: None,
            last_report: None,
        }
    }

    /// Builds a publish handler over the world's adapters.
    #[must_use]
    pub fn handler(
        &self,
    ) -> PublishErrorHandler<
        InMemoryChangeSetRepository,
        InMemoryPublisher,
        InMemoryEventChannel,
        InMemoryEventChannel,
        DefaultClock,
    > {
        PublishErrorHandler::new(
            PublishCollaborators {
                repository: Arc::clone(&self.repository),
                publisher: Arc::clone(&self.publisher),
                events: Arc::clone(&self.channel),
                dead_letters: Arc::clone(&self.channel),
                clock: Arc::new(DefaultClock),
            },
            &PublishConfig::immediate(1),
        )
    }

    /// Returns the scenario's change set.
    ///
    /// # Errors
    ///
    /// Returns an error when no change set has been created yet.
    pub fn current(&self) -> Result<&ChangeSet, eyre::Report> {
        self.change_set
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing change set in scenario world"))
    }
}

impl Default for PublishWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PublishWorld {
    PublishWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
