//! Notification records relayed to real-time clients.

use jobtrack_core::error::{CoreError, CoreResult};
use jobtrack_core::status::ApplicationStatus;
use jobtrack_core::types::Timestamp;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NotificationPayload
// ---------------------------------------------------------------------------

/// What a caller hands to the relay: a notification without its timestamp.
///
/// The timestamp is assigned on receipt by the
/// [`StatusService`](crate::StatusService), never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Free-form event tag, e.g. `"status_changed"`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Opaque application identifier. Required.
    pub application_id: String,

    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub role: String,

    /// Absent for events that are not status changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,

    #[serde(default)]
    pub message: String,
}

impl NotificationPayload {
    /// Create a payload with the required fields; the rest start empty.
    pub fn new(event_type: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            application_id: application_id.into(),
            company: String::new(),
            role: String::new(),
            status: None,
            message: String::new(),
        }
    }

    /// Attach the company and role the application is for.
    pub fn with_position(mut self, company: impl Into<String>, role: impl Into<String>) -> Self {
        self.company = company.into();
        self.role = role.into();
        self
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Reject payloads the relay cannot route or display.
    pub fn validate(&self) -> CoreResult<()> {
        if self.application_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "applicationId must not be empty".to_string(),
            ));
        }
        if self.event_type.trim().is_empty() {
            return Err(CoreError::Validation("type must not be empty".to_string()));
        }
        Ok(())
    }

    /// Stamp the payload, producing an immutable event.
    pub fn into_event(self, timestamp: Timestamp) -> NotificationEvent {
        NotificationEvent {
            event_type: self.event_type,
            application_id: self.application_id,
            company: self.company,
            role: self.role,
            status: self.status,
            message: self.message,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationEvent
// ---------------------------------------------------------------------------

/// A stamped notification, as stored in history and pushed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub application_id: String,
    pub company: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    pub message: String,
    /// When the relay accepted the notification (UTC).
    pub timestamp: Timestamp,
}

impl NotificationEvent {
    /// Serialize into the text frame pushed over the real-time transport.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&serde_json::json!({
            "type": "notification",
            "data": self,
        }))
    }
}
