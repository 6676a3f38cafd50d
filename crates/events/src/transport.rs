//! Seam between the relay and the real-time transport.
//!
//! The transport owns the sockets. It reports connects and disconnects to the
//! [`ConnectionRegistry`](crate::ConnectionRegistry) and exposes a `send` the
//! relay calls for each recipient.

use std::time::Duration;

use async_trait::async_trait;

/// Why a frame could not be delivered to one connection.
///
/// Always absorbed by the relay; never surfaced to the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The outbound channel is gone; the session is dead.
    #[error("connection channel closed")]
    ChannelClosed,

    /// The transport has no socket for this id.
    #[error("connection unknown to transport")]
    UnknownConnection,

    /// The send did not complete within the configured bound.
    #[error("send timed out after {0:?}")]
    TimedOut(Duration),

    /// The event could not be encoded as a frame.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Whether the failure means the session can never be written to again.
    pub fn is_broken_channel(&self) -> bool {
        matches!(
            self,
            DeliveryError::ChannelClosed | DeliveryError::UnknownConnection
        )
    }
}

/// Outbound half of the real-time transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push one text frame to a connection.
    async fn send(&self, connection_id: &str, frame: &str) -> Result<(), DeliveryError>;

    /// Whether the transport is accepting connections yet.
    fn is_initialized(&self) -> bool;
}
