//! Outcome of a single publish attempt.

use super::BusinessObjectDescriptor;
use serde::{Deserialize, Serialize};

/// Per-object synchronization result reported by the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    descriptor: BusinessObjectDescriptor,
    succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl SyncResult {
    /// Records a successful synchronization of `descriptor`.
    #[must_use]
    pub const fn success(descriptor: BusinessObjectDescriptor) -> Self {
        Self {
            descriptor,
            succeeded: true,
            detail: None,
        }
    }

    /// Records a failed synchronization of `descriptor`.
    #[must_use]
    pub fn error(descriptor: BusinessObjectDescriptor, detail: impl Into<String>) -> Self {
        Self {
            descriptor,
            succeeded: false,
            detail: Some(detail.into()),
        }
    }

    /// Returns the synchronized object.
    #[must_use]
    pub const fn descriptor(&self) -> &BusinessObjectDescriptor {
        &self.descriptor
    }

    /// Returns whether this object synchronized.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.succeeded
    }

    /// Returns the failure detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Ephemeral summary produced per publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    success: bool,
    results: Vec<SyncResult>,
    summary: String,
}

impl PublishSummary {
    /// Creates a summary.
    #[must_use]
    pub fn new(success: bool, results: Vec<SyncResult>, summary: impl Into<String>) -> Self {
        Self {
            success,
            results,
            summary: summary.into(),
        }
    }

    /// Creates a summary whose success flag is derived from the results.
    #[must_use]
    pub fn from_results(results: Vec<SyncResult>) -> Self {
        let failed = results.iter().filter(|result| !result.is_success()).count();
        let summary = format!(
            "{} of {} objects synchronized",
            results.len().saturating_sub(failed),
            results.len()
        );
        Self::new(failed == 0, results, summary)
    }

    /// Returns whether the publish fully succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns all per-object results.
    #[must_use]
    pub fn results(&self) -> &[SyncResult] {
        &self.results
    }

    /// Returns the human summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Splits results into `(successes, errors)`.
    #[must_use]
    pub fn partition(&self) -> (Vec<SyncResult>, Vec<SyncResult>) {
        self.results
            .iter()
            .cloned()
            .partition(SyncResult::is_success)
    }
}
