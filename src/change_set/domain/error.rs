//! Error types for change set domain validation and parsing.

use super::{ChangeSetGuid, ChangeSetState};
use thiserror::Error;

/// Errors returned while constructing or mutating change set domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeSetDomainError {
    /// The change set name is empty after trimming.
    #[error("change set name must not be empty")]
    EmptyName,

    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserGuid,

    /// The business object type is empty after trimming.
    #[error("business object type must not be empty")]
    EmptyObjectType,

    /// The business object identifier is empty after trimming.
    #[error("business object identifier must not be empty")]
    EmptyObjectIdentifier,

    /// The change set identifier is not a valid GUID.
    #[error("invalid change set GUID '{0}'")]
    InvalidGuid(String),

    /// The requested state transition violates the monotonic state order.
    #[error("invalid state transition for change set {guid}: {from} -> {to}")]
    InvalidStateTransition {
        /// Change set identifier.
        guid: ChangeSetGuid,
        /// Current state.
        from: ChangeSetState,
        /// Requested target state.
        to: ChangeSetState,
    },

    /// Members, reviewers, and details may only change while the set is open.
    #[error("change set {guid} cannot be modified in state {state}")]
    ChangeNotAllowed {
        /// Change set identifier.
        guid: ChangeSetGuid,
        /// Current state.
        state: ChangeSetState,
    },
}

/// Error returned while parsing change set states from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown change set state: {0}")]
pub struct ParseChangeSetStateError(pub String);
