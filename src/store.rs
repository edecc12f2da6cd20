//! The in-memory standards catalog.
//!
//! [`StandardsStore`] is immutable once built. [`SharedStore`] holds the
//! current store behind a single `Arc` so a reload can publish a fully built
//! replacement without readers ever seeing a half-built one.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::models::CanonicalRecord;
use crate::search::StandardsQuery;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StandardsStore {
    records: Vec<CanonicalRecord>,
    sections: Vec<String>,
    sources: Vec<String>,
}

impl StandardsStore {
    /// Wraps already deduplicated records and sorted vocabularies.
    pub fn new(records: Vec<CanonicalRecord>, sections: Vec<String>, sources: Vec<String>) -> Self {
        Self {
            records,
            sections,
            sources,
        }
    }

    pub fn all_records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Numeric sections, naturally sorted.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Source labels, lexically sorted.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching `query`, in store order.
    pub fn search<'a>(&'a self, query: &StandardsQuery) -> Vec<&'a CanonicalRecord> {
        let matcher = query.matcher();
        self.records.iter().filter(|r| matcher.matches(r)).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("standards store lock poisoned")]
    Poisoned,
}

/// The currently published store, swappable as a whole.
#[derive(Debug, Default)]
pub struct SharedStore {
    current: RwLock<Arc<StandardsStore>>,
}

impl SharedStore {
    pub fn new(store: StandardsStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// A handle to the current store. The lock is held only to clone the `Arc`.
    pub fn current(&self) -> Result<Arc<StandardsStore>, StoreError> {
        let guard = self.current.read().map_err(|_| StoreError::Poisoned)?;
        Ok(Arc::clone(&guard))
    }

    /// Publishes `store`, returning the one it replaced.
    pub fn replace(&self, store: StandardsStore) -> Result<Arc<StandardsStore>, StoreError> {
        let next = Arc::new(store);
        let mut guard = self.current.write().map_err(|_| StoreError::Poisoned)?;
        Ok(std::mem::replace(&mut *guard, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, id: &str) -> CanonicalRecord {
        CanonicalRecord {
            source: source.into(),
            control_id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn accessors_expose_built_contents() {
        let store = StandardsStore::new(
            vec![record("NIST", "AC-1")],
            vec!["1".into()],
            vec!["NIST".into()],
        );
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert_eq!(store.all_records()[0].control_id, "AC-1");
        assert_eq!(store.sections(), &["1"]);
        assert_eq!(store.sources(), &["NIST"]);
    }

    #[test]
    fn replace_publishes_new_store_and_keeps_old_handles_valid() {
        let shared = SharedStore::new(StandardsStore::new(
            vec![record("NIST", "AC-1")],
            vec![],
            vec!["NIST".into()],
        ));
        let before = shared.current().unwrap();

        let old = shared
            .replace(StandardsStore::new(
                vec![record("ISO", "A.5"), record("ISO", "A.6")],
                vec![],
                vec!["ISO".into()],
            ))
            .unwrap();

        assert!(Arc::ptr_eq(&before, &old));
        assert_eq!(before.len(), 1);
        assert_eq!(shared.current().unwrap().len(), 2);
        assert_eq!(shared.current().unwrap().sources(), &["ISO"]);
    }

    #[test]
    fn default_shared_store_is_empty() {
        let shared = SharedStore::default();
        assert!(shared.current().unwrap().is_empty());
    }
}
