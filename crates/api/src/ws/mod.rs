//! WebSocket infrastructure for real-time notification delivery.
//!
//! Provides the connection gateway (the relay's transport), heartbeat
//! monitoring, and the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod gateway;

pub use gateway::WsGateway;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
