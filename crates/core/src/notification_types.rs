//! Well-known notification type tags.
//!
//! The `type` field of a notification is free-form, but the workflow engine
//! and the frontend agree on these values for application lifecycle events.

/// An application moved to a new [`ApplicationStatus`](crate::status::ApplicationStatus).
pub const NOTIFICATION_STATUS_CHANGED: &str = "status_changed";

/// The application was archived after its grace period elapsed.
pub const NOTIFICATION_APPLICATION_ARCHIVED: &str = "application_archived";
