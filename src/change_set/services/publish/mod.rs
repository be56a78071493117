//! Publish synchronization: pipeline, error policy, and trigger consumer.

mod consumer;
mod error_policy;
mod events;
mod pipeline;

pub use consumer::{ConsumerReport, PublishConsumer};
pub use error_policy::{
    CompensationReport, CompensationStep, FailureClass, FailureReport, PublishCollaborators,
    PublishErrorHandler, PublishHandler, PublishOutcome,
};
pub use events::ChangeSetEventFactory;
pub use pipeline::{PublishPipeline, PublishPipelineError};
