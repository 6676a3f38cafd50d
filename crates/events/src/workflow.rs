//! Boundary with the durable workflow engine.
//!
//! Workflow activities depend on [`NotificationSink`] rather than on the
//! relay directly. `send_notification` has no error path, so an activity that
//! notifies can never fail (and be retried) because of real-time delivery.

use async_trait::async_trait;
use jobtrack_core::notification_types::{
    NOTIFICATION_APPLICATION_ARCHIVED, NOTIFICATION_STATUS_CHANGED,
};
use jobtrack_core::status::ApplicationStatus;
use serde::{Deserialize, Serialize};

use crate::event::NotificationPayload;

/// Fire-and-forget notification target used by workflow activities.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_notification(&self, payload: NotificationPayload);
}

/// A status transition emitted by an application workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub application_id: String,
    pub company: String,
    pub role: String,
    pub status: ApplicationStatus,
}

impl StatusChange {
    /// Notification tag for this transition: `application_archived` for
    /// archiving, `status_changed` otherwise.
    pub fn notification_type(&self) -> &'static str {
        match self.status {
            ApplicationStatus::Archived => NOTIFICATION_APPLICATION_ARCHIVED,
            _ => NOTIFICATION_STATUS_CHANGED,
        }
    }

    /// Convert into a notification with the status's standard message.
    pub fn into_payload(self) -> NotificationPayload {
        let event_type = self.notification_type();
        let message = self.status.status_message();
        NotificationPayload::new(event_type, self.application_id)
            .with_position(self.company, self.role)
            .with_status(self.status)
            .with_message(message)
    }
}

/// Activity body for "notify status change".
///
/// Safe to re-run on workflow retry: it only pushes another notification.
pub async fn notify_status_change_activity(sink: &dyn NotificationSink, change: StatusChange) {
    tracing::info!(
        application_id = %change.application_id,
        status = %change.status,
        terminal = change.status.is_terminal(),
        "Executing notify_status_change_activity"
    );
    sink.send_notification(change.into_payload()).await;
}
