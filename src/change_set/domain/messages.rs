//! Inbound publish triggers and outbound completion messages.
//!
//! These are the wire contracts between the publish pipeline and the
//! surrounding transport; all of them round-trip through JSON.

use super::{ChangeSetGuid, SyncResult, UserGuid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a user as carried on messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    /// User identifier.
    pub user_guid: UserGuid,
    /// Display name, when the transport knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserMetadata {
    /// Creates metadata carrying only the user identifier.
    #[must_use]
    pub const fn new(user_guid: UserGuid) -> Self {
        Self {
            user_guid,
            display_name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Correlation properties attached to a trigger by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerProperties {
    /// Change set name at the time the publish was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_name: Option<String>,
    /// Change set creator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserMetadata>,
    /// User who requested the publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<UserMetadata>,
}

/// Inbound "publish this change set" message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishTrigger {
    /// Change set to publish.
    pub change_set_guid: ChangeSetGuid,
    /// Correlation properties.
    #[serde(default)]
    pub properties: TriggerProperties,
}

impl PublishTrigger {
    /// Creates a trigger with no correlation properties.
    #[must_use]
    pub fn new(change_set_guid: ChangeSetGuid) -> Self {
        Self {
            change_set_guid,
            properties: TriggerProperties::default(),
        }
    }

    /// Sets the change set name property.
    #[must_use]
    pub fn with_change_set_name(mut self, name: impl Into<String>) -> Self {
        self.properties.change_set_name = Some(name.into());
        self
    }

    /// Sets the creator property.
    #[must_use]
    pub fn with_creator(mut self, creator: UserMetadata) -> Self {
        self.properties.creator = Some(creator);
        self
    }

    /// Sets the publish initiator property.
    #[must_use]
    pub fn with_initiator(mut self, initiator: UserMetadata) -> Self {
        self.properties.initiator = Some(initiator);
        self
    }

    /// Decodes a trigger from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload is malformed.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Encodes the trigger into its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Kind of completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeSetEventType {
    /// The pipeline ran to completion; see `success` for the publish result.
    ChangeSetPublished,
    /// The pipeline failed and the change set was quarantined.
    ChangeSetPublishFailed,
}

/// Outbound completion event emitted after every publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetCompletionEvent {
    /// Event kind.
    pub event_type: ChangeSetEventType,
    /// Change set identifier.
    pub guid: ChangeSetGuid,
    /// Change set name, when known.
    pub name: Option<String>,
    /// Change set creator, when known.
    pub creator_metadata: Option<UserMetadata>,
    /// Publish initiator, when known.
    pub publish_initiator_metadata: Option<UserMetadata>,
    /// Whether the publish succeeded.
    pub success: bool,
    /// Human-readable summary.
    pub publish_summary: String,
    /// Objects that synchronized.
    pub sync_success_results: Vec<SyncResult>,
    /// Objects that failed to synchronize.
    pub sync_error_results: Vec<SyncResult>,
    /// Event creation time.
    pub occurred_at: DateTime<Utc>,
}

/// Trigger forwarded to the dead-letter destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    /// The original triggering message, unchanged.
    pub message: PublishTrigger,
    /// Rendered primary failure.
    pub reason: String,
    /// Number of pipeline attempts made.
    pub attempts: u32,
    /// Time the message was dead-lettered.
    pub failed_at: DateTime<Utc>,
}
