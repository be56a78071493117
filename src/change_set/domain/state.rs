//! Change set lifecycle state and its transition rules.

use super::ParseChangeSetStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Change set lifecycle state.
///
/// Variants are declared in lifecycle order; the derived `Ord` is the
/// transition order `Open < Locked < Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeSetState {
    /// Members and reviewers may be changed.
    Open,
    /// Frozen, either ahead of a publish or after a publish failure.
    Locked,
    /// Published. Terminal.
    Finalized,
}

impl ChangeSetState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Locked => "LOCKED",
            Self::Finalized => "FINALIZED",
        }
    }

    /// Returns whether no further transition may leave this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns whether change sets in this state claim their members.
    #[must_use]
    pub const fn is_claiming(self) -> bool {
        !self.is_terminal()
    }

    /// Returns whether a transition from `self` to `target` is permitted.
    ///
    /// Re-requesting the current state is permitted (idempotent) except from
    /// the terminal state, which rejects every request.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        !self.is_terminal() && target >= self
    }
}

impl TryFrom<&str> for ChangeSetState {
    type Error = ParseChangeSetStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "OPEN" => Ok(Self::Open),
            "LOCKED" => Ok(Self::Locked),
            "FINALIZED" => Ok(Self::Finalized),
            _ => Err(ParseChangeSetStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for ChangeSetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
