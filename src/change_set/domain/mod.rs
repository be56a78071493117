//! Domain model for change set lifecycle and publishing.
//!
//! The domain covers descriptors, members, the change set aggregate with its
//! monotonic state machine, derived object status, and the message contracts
//! of the publish pipeline. Persistence and transport stay outside.

mod change_set;
mod descriptor;
mod error;
mod ids;
mod member;
mod messages;
mod publish;
mod state;
mod status;

pub use change_set::{ChangeSet, PersistedChangeSetData};
pub use descriptor::BusinessObjectDescriptor;
pub use error::{ChangeSetDomainError, ParseChangeSetStateError};
pub use ids::{ChangeSetGuid, UserGuid};
pub use member::{ACTION_METADATA_KEY, ChangeSetMember, MemberAction, MemberMetadata};
pub use messages::{
    ChangeSetCompletionEvent, ChangeSetEventType, DeadLetter, PublishTrigger, TriggerProperties,
    UserMetadata,
};
pub use publish::{PublishSummary, SyncResult};
pub use state::ChangeSetState;
pub use status::ChangeSetObjectStatus;
