use std::str::FromStr;
use std::time::Duration;

use jobtrack_events::DEFAULT_HISTORY_CAPACITY;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background tasks to stop after the listener closes.
    pub shutdown_timeout_secs: u64,
    /// Notifications kept in the in-memory history (default: `100`).
    pub history_capacity: usize,
    /// Upper bound for one per-connection send in milliseconds (default: `2000`).
    pub send_timeout_ms: u64,
    /// Interval between WebSocket heartbeat pings in seconds (default: `30`).
    pub heartbeat_interval_secs: u64,
    /// Outbound frames buffered per WebSocket connection (default: `64`).
    pub ws_channel_capacity: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `HOST`                           | `0.0.0.0`               |
    /// | `PORT`                           | `3000`                  |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`          | `30`                    |
    /// | `NOTIFICATION_HISTORY_CAPACITY`  | `100`                   |
    /// | `NOTIFICATION_SEND_TIMEOUT_MS`   | `2000`                  |
    /// | `WS_HEARTBEAT_INTERVAL_SECS`     | `30`                    |
    /// | `WS_CHANNEL_CAPACITY`            | `64`                    |
    ///
    /// Panics on unparseable values; misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            history_capacity: env_or("NOTIFICATION_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY),
            send_timeout_ms: env_or("NOTIFICATION_SEND_TIMEOUT_MS", 2000),
            heartbeat_interval_secs: env_or("WS_HEARTBEAT_INTERVAL_SECS", 30),
            ws_channel_capacity: env_or("WS_CHANNEL_CAPACITY", 64),
        }
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            send_timeout_ms: 2000,
            heartbeat_interval_secs: 30,
            ws_channel_capacity: 64,
        }
    }
}

/// Read and parse `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid value: {e}")),
        Err(_) => default,
    }
}
