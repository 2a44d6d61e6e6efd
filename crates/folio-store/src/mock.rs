//! In-memory store for tests.
//!
//! [`MockStore`] keeps every namespace in a `BTreeMap`, so scans come back in
//! key order like the redb backend. Namespaces can be marked as failing to
//! exercise I/O error paths in callers.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::store::{CatalogStore, RawRecord, StoreError, StoreErrorKind, validate_namespace};

const BACKEND: &str = "Mock";

/// In-memory [`CatalogStore`] with failure injection.
#[derive(Debug, Default)]
pub struct MockStore {
    namespaces: HashMap<String, BTreeMap<String, Vec<u8>>>,
    failing: HashSet<String>,
}

impl MockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `namespace` fail with an I/O error.
    pub fn fail_namespace(&mut self, namespace: &str) {
        self.failing.insert(namespace.to_owned());
    }

    /// Undo [`fail_namespace`](Self::fail_namespace).
    pub fn heal_namespace(&mut self, namespace: &str) {
        self.failing.remove(namespace);
    }

    fn check(&self, namespace: &str) -> Result<(), StoreError> {
        validate_namespace(namespace).map_err(|e| e.with_backend(BACKEND))?;
        if self.failing.contains(namespace) {
            return Err(StoreError::io(std::io::Error::other("injected failure"))
                .with_backend(BACKEND)
                .with_namespace(namespace));
        }
        Ok(())
    }
}

impl CatalogStore for MockStore {
    fn put_bytes(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check(namespace)?;
        self.namespaces
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn get_bytes(&mut self, namespace: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.check(namespace)?;
        self.namespaces
            .get(namespace)
            .and_then(|records| records.get(key))
            .cloned()
            .ok_or_else(|| StoreError::not_found(namespace, key).with_backend(BACKEND))
    }

    fn exists(&mut self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        self.check(namespace)?;
        Ok(self
            .namespaces
            .get(namespace)
            .is_some_and(|records| records.contains_key(key)))
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.check(namespace)?;
        if let Some(records) = self.namespaces.get_mut(namespace) {
            records.remove(key);
        }
        Ok(())
    }

    fn scan(&mut self, namespace: &str) -> Result<Vec<RawRecord>, StoreError> {
        self.check(namespace)?;
        Ok(self
            .namespaces
            .get(namespace)
            .map(|records| {
                records
                    .iter()
                    .map(|(key, value)| RawRecord {
                        key: key.clone(),
                        value: value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogStoreExt;

    #[test]
    fn test_mock_roundtrip_and_scan_order() {
        let mut store = MockStore::new();
        store.put("books", "b", &2).unwrap();
        store.put("books", "a", &1).unwrap();

        let value: i32 = store.get("books", "a").unwrap();
        assert_eq!(value, 1);

        let keys: Vec<String> = store
            .scan("books")
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mut store = MockStore::new();
        store.put("books", "a", &1).unwrap();
        store.fail_namespace("books");

        let err = store.scan("books").unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Io);
        assert!(store.scan("nav").unwrap().is_empty());

        store.heal_namespace("books");
        assert_eq!(store.count("books").unwrap(), 1);
    }
}
