//! # Record Store
//!
//! In-memory cache of the records known locally. Only ever replaced as a
//! whole; the last refresh to finish wins.

use parking_lot::RwLock;

use crate::domain::{Record, RecordId};

/// Cache of locally known records, in ledger enumeration order.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<Vec<Record>>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache.
    pub fn replace(&self, records: Vec<Record>) {
        *self.records.write() = records;
    }

    /// Drop every cached record.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Copy of the cached records.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    /// Copy of one cached record.
    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.records.read().iter().find(|r| &r.id == id).cloned()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Principal;

    fn record(id: &str) -> Record {
        Record {
            id: RecordId::new(id),
            name: id.to_string(),
            frequency: 1,
            streak_public: 0,
            category_code: Some(0),
            created_at: 0,
            creator: Principal::new("0xabc"),
            verified: false,
        }
    }

    #[test]
    fn test_replace_discards_previous_contents() {
        let store = RecordStore::new();
        store.replace(vec![record("a"), record("b")]);
        store.replace(vec![record("c")]);

        let ids: Vec<String> = store.snapshot().into_iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["c"]);
        assert!(store.get(&RecordId::new("a")).is_none());
    }

    #[test]
    fn test_clear_empties_cache() {
        let store = RecordStore::new();
        store.replace(vec![record("a")]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_get_and_len() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        store.replace(vec![record("a"), record("b")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&RecordId::new("b")).map(|r| r.name), Some("b".to_string()));
    }
}
