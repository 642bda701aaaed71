//! # Activity Log
//!
//! Bounded record of user-visible actions, newest first.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::{ActivityAction, ActivityEntry, Principal};

/// Bounded, newest-first activity log.
#[derive(Debug)]
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    /// Create a log retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Prepend an entry stamped now, evicting the oldest when full.
    pub fn record(&self, action: ActivityAction, principal: Option<Principal>) {
        let entry = ActivityEntry {
            timestamp: now_millis(),
            action,
            principal,
        };
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Copy of the entries, newest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HISTORY_CAPACITY;
    use proptest::prelude::*;

    fn loaded(count: usize) -> ActivityAction {
        ActivityAction::DataLoaded { count }
    }

    #[test]
    fn test_newest_first() {
        let log = ActivityLog::new(HISTORY_CAPACITY);
        log.record(loaded(1), None);
        log.record(loaded(2), Some(Principal::new("0xabc")));

        let entries = log.entries();
        assert_eq!(entries[0].action, loaded(2));
        assert_eq!(entries[0].principal, Some(Principal::new("0xabc")));
        assert_eq!(entries[1].action, loaded(1));
    }

    #[test]
    fn test_eleventh_entry_evicts_oldest() {
        let log = ActivityLog::new(HISTORY_CAPACITY);
        for i in 0..11 {
            log.record(loaded(i), None);
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].action, loaded(10));
        assert_eq!(entries[9].action, loaded(1));
        assert!(!entries.iter().any(|e| e.action == loaded(0)));
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(n in 0usize..64) {
            let log = ActivityLog::new(HISTORY_CAPACITY);
            for i in 0..n {
                log.record(loaded(i), None);
            }
            prop_assert_eq!(log.len(), n.min(HISTORY_CAPACITY));
            if n > 0 {
                prop_assert_eq!(&log.entries()[0].action, &loaded(n - 1));
            }
        }
    }
}
