//! Port contracts for change set lifecycle and publishing.
//!
//! Ports define infrastructure-agnostic interfaces used by change set
//! services.

pub mod messaging;
pub mod publisher;
pub mod repository;

pub use messaging::{
    CompletionEventSink, DeadLetterSink, MessagingError, MessagingResult, PublishTriggerSink,
};
pub use publisher::{Publisher, PublisherError, PublisherResult};
pub use repository::{
    ChangeSetLoader, ChangeSetRepository, ChangeSetRepositoryError, ChangeSetRepositoryResult,
    ChangeSetStateUpdater,
};
