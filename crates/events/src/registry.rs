//! Registry of live real-time sessions.
//!
//! Connections are created when the transport reports a connect and removed
//! when it reports a disconnect or the relay detects a broken channel. The
//! registry lock is only held to mutate or copy the map, never across a send.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use jobtrack_core::error::{CoreError, CoreResult};
use jobtrack_core::types::{ConnectionId, Timestamp};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// One live session over the real-time transport.
pub struct Connection {
    id: ConnectionId,
    connected_at: Timestamp,
    /// Milliseconds since the Unix epoch.
    last_activity_ms: AtomicI64,
    alive: AtomicBool,
    delivered: AtomicU64,
    failed: AtomicU64,
    /// Held for the duration of one send so frames never interleave.
    send_lock: Mutex<()>,
}

impl Connection {
    fn new(id: ConnectionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            connected_at: now,
            last_activity_ms: AtomicI64::new(now.timestamp_millis()),
            alive: AtomicBool::new(true),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            send_lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Time of the last successful send, or the connect time if none.
    pub fn last_activity_at(&self) -> Timestamp {
        DateTime::from_timestamp_millis(self.last_activity_ms.load(Ordering::Relaxed))
            .unwrap_or(self.connected_at)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn messages_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn delivery_failures(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Wait for exclusive use of this connection's outbound path.
    pub async fn lock_sends(&self) -> MutexGuard<'_, ()> {
        self.send_lock.lock().await
    }

    pub(crate) fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.last_activity_ms
            .fetch_max(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            id: self.id.clone(),
            connected_at: self.connected_at,
            last_activity_at: self.last_activity_at(),
            messages_delivered: self.messages_delivered(),
            delivery_failures: self.delivery_failures(),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Per-connection entry in [`ConnectionStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub id: ConnectionId,
    pub connected_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub messages_delivered: u64,
    pub delivery_failures: u64,
}

/// Point-in-time view of the registry. The default value is the zeroed
/// stats reported when the registry cannot be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    /// Distinct connection ids ever registered.
    pub total_connections: u64,
    /// Connections currently registered.
    pub active_connections: usize,
    pub connections: Vec<ConnectionSummary>,
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RegistryInner {
    /// Live connections in registration order.
    active: IndexMap<ConnectionId, Arc<Connection>>,
    /// Every id ever registered, for `total_connections`.
    seen: HashSet<ConnectionId>,
}

/// Tracks live sessions. Shared via `Arc` between the transport callbacks,
/// the relay and the status facade.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new live connection.
    ///
    /// Fails with [`CoreError::DuplicateConnection`] if the id is already
    /// live; the existing connection is left untouched.
    pub fn register(&self, id: impl Into<ConnectionId>) -> CoreResult<Arc<Connection>> {
        let id = id.into();
        let mut inner = self.write()?;

        if inner.active.contains_key(&id) {
            tracing::warn!(conn_id = %id, "Rejected duplicate connection registration");
            return Err(CoreError::DuplicateConnection(id));
        }

        let conn = Arc::new(Connection::new(id.clone()));
        inner.seen.insert(id.clone());
        inner.active.insert(id, Arc::clone(&conn));
        Ok(conn)
    }

    /// Remove a connection. Unknown ids are ignored.
    ///
    /// Returns whether a connection was removed.
    pub fn unregister(&self, id: &str) -> CoreResult<bool> {
        let removed = self.write()?.active.shift_remove(id);
        if let Some(conn) = &removed {
            conn.mark_dead();
        }
        Ok(removed.is_some())
    }

    /// Remove `conn` only if it is still the session registered under its id.
    ///
    /// A newer session that reconnected with the same id is left in place.
    pub fn unregister_connection(&self, conn: &Arc<Connection>) -> CoreResult<bool> {
        let mut inner = self.write()?;
        conn.mark_dead();

        let is_current = inner
            .active
            .get(conn.id())
            .is_some_and(|current| Arc::ptr_eq(current, conn));
        if is_current {
            inner.active.shift_remove(conn.id());
        }
        Ok(is_current)
    }

    pub fn get(&self, id: &str) -> CoreResult<Option<Arc<Connection>>> {
        Ok(self.read()?.active.get(id).cloned())
    }

    /// Copy of the live connections, in registration order.
    pub fn active(&self) -> CoreResult<Vec<Arc<Connection>>> {
        Ok(self.read()?.active.values().cloned().collect())
    }

    /// Invoke `f` for every live connection, in registration order.
    ///
    /// Iterates over a copy, so `f` may register or unregister connections
    /// without deadlocking; such changes may or may not be observed.
    pub fn for_each_active<F>(&self, mut f: F) -> CoreResult<()>
    where
        F: FnMut(&Arc<Connection>),
    {
        for conn in self.active()? {
            f(&conn);
        }
        Ok(())
    }

    pub fn active_count(&self) -> CoreResult<usize> {
        Ok(self.read()?.active.len())
    }

    pub fn stats(&self) -> CoreResult<ConnectionStats> {
        let inner = self.read()?;
        Ok(ConnectionStats {
            total_connections: inner.seen.len() as u64,
            active_connections: inner.active.len(),
            connections: inner.active.values().map(|c| c.summary()).collect(),
        })
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, RegistryInner>> {
        self.inner
            .read()
            .map_err(|_| CoreError::Internal("connection registry lock poisoned".to_string()))
    }

    fn write(&self) -> CoreResult<RwLockWriteGuard<'_, RegistryInner>> {
        self.inner
            .write()
            .map_err(|_| CoreError::Internal("connection registry lock poisoned".to_string()))
    }

    /// Poison the internal lock so callers observe an internal fault.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.inner.write();
            panic!("poisoning connection registry for test");
        }));
    }
}
