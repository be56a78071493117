//! In-memory adapters for change set persistence, messaging, and publishing.

mod channel;
mod publisher;
mod repository;

pub use channel::{ChannelTriggerQueue, InMemoryEventChannel};
pub use publisher::InMemoryPublisher;
pub use repository::InMemoryChangeSetRepository;
