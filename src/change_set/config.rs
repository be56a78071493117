//! Deployment configuration for change set services and the publish pipeline.
//!
//! Every type deserializes from JSON with defaults for omitted fields.
//!
//! # Examples
//!
//! ```
//! use changeset_sync::change_set::config::{BackoffPolicy, PublishConfig};
//!
//! let config = PublishConfig::from_json_str(
//!     r#"{ "retry": { "max_retries": 5, "backoff": { "fixed": { "delay_ms": 10 } } } }"#,
//! )
//! .expect("valid config");
//! assert_eq!(config.retry.max_retries, 5);
//! assert_eq!(config.retry.backoff, BackoffPolicy::Fixed { delay_ms: 10 });
//! assert_eq!(config.max_concurrency, PublishConfig::default().max_concurrency);
//! ```

use serde::Deserialize;
use std::time::Duration;

/// Feature settings for change set management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChangeSetSettings {
    /// Whether change sets are enabled; mutations are refused when `false`.
    pub enabled: bool,
}

impl Default for ChangeSetSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Delay strategy between retries of a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffPolicy {
    /// Retry immediately.
    None,
    /// Wait the same delay before every retry.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Grow the delay by `base_ms` per retry, capped at `max_ms`.
    Linear {
        /// Delay increment in milliseconds.
        base_ms: u64,
        /// Upper bound in milliseconds.
        max_ms: u64,
    },
    /// Double the delay per retry starting at `base_ms`, capped at `max_ms`.
    Exponential {
        /// Initial delay in milliseconds.
        base_ms: u64,
        /// Upper bound in milliseconds.
        max_ms: u64,
    },
}

impl BackoffPolicy {
    /// Returns the delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(self, retry: u32) -> Duration {
        let step = u64::from(retry.max(1));
        let millis = match self {
            Self::None => 0,
            Self::Fixed { delay_ms } => delay_ms,
            Self::Linear { base_ms, max_ms } => base_ms.saturating_mul(step).min(max_ms),
            Self::Exponential { base_ms, max_ms } => {
                let factor = 1_u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
                base_ms.saturating_mul(factor).min(max_ms)
            }
        };
        Duration::from_millis(millis)
    }
}

/// Retry budget for recoverable publish failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::Exponential {
                base_ms: 500,
                max_ms: 30_000,
            },
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffPolicy::None,
        }
    }

    /// Returns the delay before retry `retry`, or `None` once the budget is spent.
    #[must_use]
    pub fn next_delay(&self, retry: u32) -> Option<Duration> {
        (retry <= self.max_retries).then(|| self.backoff.delay_for(retry))
    }
}

/// Publish pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Retry budget for recoverable failures.
    pub retry: RetryPolicy,
    /// Upper bound on one external publish call, in milliseconds.
    pub publish_timeout_ms: u64,
    /// Maximum publish attempts in flight across distinct change sets.
    pub max_concurrency: usize,
    /// Name of the normal result destination.
    pub result_destination: String,
    /// Name of the dead-letter destination.
    pub dead_letter_destination: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            publish_timeout_ms: 300_000,
            max_concurrency: 4,
            result_destination: "changeset.publish.results".to_owned(),
            dead_letter_destination: "changeset.publish.dlq".to_owned(),
        }
    }
}

impl PublishConfig {
    /// A configuration that retries immediately; useful for tests.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            retry: RetryPolicy {
                max_retries,
                backoff: BackoffPolicy::None,
            },
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the document is malformed.
    pub fn from_json_str(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Returns the publish call timeout.
    #[must_use]
    pub const fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}
