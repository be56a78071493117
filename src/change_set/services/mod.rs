//! Application services for change set lifecycle and publishing.

mod error;
mod management;
mod membership;
pub mod publish;
mod state;
mod status;

pub use error::{ChangeSetServiceError, ChangeSetServiceResult};
pub use management::{
    ChangeSetManagementService, CreateChangeSetRequest, UpdateChangeSetDetailsRequest,
};
pub use membership::ChangeSetMembershipService;
pub use state::{ChangeSetStateMachine, TransitionOutcome};
pub use status::ObjectStatusResolver;
