//! Notification relay for application lifecycle events.
//!
//! Bridges the durable workflow engine and the ephemeral real-time transport.
//! [`StatusService`] is the non-failing entry point for workflow activities
//! and HTTP handlers. It hands events to the [`NotificationRelay`], which
//! records them in the bounded [`HistoryBuffer`] and fans them out to the
//! sessions tracked by the [`ConnectionRegistry`] through a [`Transport`].

pub mod event;
pub mod history;
pub mod registry;
pub mod relay;
pub mod status;
pub mod transport;
pub mod workflow;

pub use event::{NotificationEvent, NotificationPayload};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use registry::{Connection, ConnectionRegistry, ConnectionStats, ConnectionSummary};
pub use relay::{BroadcastReport, DeliveryOutcome, NotificationRelay, DEFAULT_SEND_TIMEOUT};
pub use status::{HealthState, HealthStatus, StatusService};
pub use transport::{DeliveryError, Transport};
pub use workflow::{notify_status_change_activity, NotificationSink, StatusChange};
