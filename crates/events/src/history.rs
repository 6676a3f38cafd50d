//! Bounded in-memory history of recent notifications.
//!
//! Oldest entries are evicted first once the buffer is full. Nothing is
//! persisted; history lives as long as the process.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use jobtrack_core::error::{CoreError, CoreResult};

use crate::event::NotificationEvent;

/// Number of notifications retained when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Fixed-capacity ring of the most recent [`NotificationEvent`]s.
pub struct HistoryBuffer {
    entries: Mutex<VecDeque<NotificationEvent>>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer retaining at most `capacity` events.
    ///
    /// A capacity of zero retains nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, evicting the oldest entry when at capacity.
    ///
    /// A timestamp older than the newest stored entry is raised to match it,
    /// so timestamps never decrease in insertion order. Returns the event as
    /// stored.
    pub fn append(&self, mut event: NotificationEvent) -> CoreResult<NotificationEvent> {
        let mut entries = self.lock()?;

        if let Some(newest) = entries.back() {
            if event.timestamp < newest.timestamp {
                event.timestamp = newest.timestamp;
            }
        }

        if self.capacity == 0 {
            return Ok(event);
        }
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(event.clone());

        Ok(event)
    }

    /// Copy of the buffer, newest first.
    pub fn snapshot(&self) -> CoreResult<Vec<NotificationEvent>> {
        let entries = self.lock()?;
        Ok(entries.iter().rev().cloned().collect())
    }

    /// Drop every stored event. Connections are unaffected.
    pub fn clear(&self) -> CoreResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, VecDeque<NotificationEvent>>> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Internal("notification history lock poisoned".to_string()))
    }

    /// Poison the internal lock so callers observe an internal fault.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.entries.lock();
            panic!("poisoning notification history for test");
        }));
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::event::NotificationPayload;

    fn event(application_id: &str) -> NotificationEvent {
        NotificationPayload::new("status_changed", application_id).into_event(Utc::now())
    }

    fn ids(events: &[NotificationEvent]) -> Vec<&str> {
        events.iter().map(|e| e.application_id.as_str()).collect()
    }

    #[test]
    fn snapshot_is_newest_first() {
        let buffer = HistoryBuffer::new(10);
        buffer.append(event("e1")).unwrap();
        buffer.append(event("e2")).unwrap();
        buffer.append(event("e3")).unwrap();

        assert_eq!(ids(&buffer.snapshot().unwrap()), vec!["e3", "e2", "e1"]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let buffer = HistoryBuffer::new(2);
        buffer.append(event("e1")).unwrap();
        buffer.append(event("e2")).unwrap();
        buffer.append(event("e3")).unwrap();

        assert_eq!(ids(&buffer.snapshot().unwrap()), vec!["e3", "e2"]);
        assert_eq!(buffer.len().unwrap(), 2);
    }

    #[test]
    fn retains_most_recent_entries_over_many_appends() {
        let buffer = HistoryBuffer::new(5);
        for i in 0..23 {
            buffer.append(event(&format!("e{i}"))).unwrap();
        }

        assert_eq!(
            ids(&buffer.snapshot().unwrap()),
            vec!["e22", "e21", "e20", "e19", "e18"]
        );
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let buffer = HistoryBuffer::new(0);
        buffer.append(event("e1")).unwrap();

        assert!(buffer.is_empty().unwrap());
    }

    #[test]
    fn clear_empties_buffer() {
        let buffer = HistoryBuffer::default();
        buffer.append(event("e1")).unwrap();
        buffer.clear().unwrap();

        assert!(buffer.snapshot().unwrap().is_empty());
        assert_eq!(buffer.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn backwards_timestamp_is_clamped() {
        let buffer = HistoryBuffer::new(10);
        let first = buffer.append(event("e1")).unwrap();

        let mut late = event("e2");
        late.timestamp = first.timestamp - Duration::seconds(5);
        let stored = buffer.append(late).unwrap();

        assert_eq!(stored.timestamp, first.timestamp);
        let snapshot = buffer.snapshot().unwrap();
        assert!(snapshot[0].timestamp >= snapshot[1].timestamp);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let buffer = HistoryBuffer::new(10);
        buffer.append(event("e1")).unwrap();
        let snapshot = buffer.snapshot().unwrap();

        buffer.append(event("e2")).unwrap();

        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn poisoned_lock_reports_internal_error() {
        let buffer = HistoryBuffer::new(10);
        buffer.poison();

        assert!(matches!(buffer.snapshot(), Err(CoreError::Internal(_))));
    }
}
