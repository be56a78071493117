//! Service-level errors for change set management and membership.

use crate::change_set::{
    domain::{BusinessObjectDescriptor, ChangeSetDomainError, ChangeSetGuid, ChangeSetState},
    ports::{ChangeSetRepositoryError, MessagingError},
};
use thiserror::Error;

/// Errors returned by change set services.
#[derive(Debug, Error)]
pub enum ChangeSetServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ChangeSetDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ChangeSetRepositoryError),

    /// Sending a message failed.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// No change set exists with the given GUID.
    #[error("change set {0} not found")]
    NotFound(ChangeSetGuid),

    /// The object is claimed by a different change set.
    #[error("object {descriptor} is a member of another change set and cannot be added to {guid}")]
    ObjectUnavailable {
        /// Object that was requested.
        descriptor: BusinessObjectDescriptor,
        /// Change set that requested it.
        guid: ChangeSetGuid,
    },

    /// More than one change set claims the same object.
    #[error("inconsistent data: object {descriptor} is claimed by {} change sets", .guids.len())]
    InconsistentClaims {
        /// Object with conflicting claims.
        descriptor: BusinessObjectDescriptor,
        /// All claiming change sets.
        guids: Vec<ChangeSetGuid>,
    },

    /// The change set cannot be removed in its current state.
    #[error("change set {guid} cannot be removed in state {state}")]
    CannotRemove {
        /// Change set identifier.
        guid: ChangeSetGuid,
        /// Current state.
        state: ChangeSetState,
    },

    /// Change sets are disabled by configuration.
    #[error("change sets are disabled")]
    Disabled,
}

/// Result type for change set service operations.
pub type ChangeSetServiceResult<T> = Result<T, ChangeSetServiceError>;
