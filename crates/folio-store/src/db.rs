//! redb-backed catalog store.
//!
//! [`RedbStore`] keeps one redb database file per namespace inside a root
//! directory:
//!
//! ```text
//! {root}/
//! +-- nav.redb      # namespace "nav"
//! +-- books.redb    # namespace "books"
//! ```
//!
//! Namespaces are opened on first use and the handles are kept for the
//! lifetime of the store. Every write is its own committed transaction, so a
//! reader sees either the old or the new value, never a partial one.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};

use crate::store::{CatalogStore, RawRecord, StoreError, StoreErrorKind, validate_namespace};

/// Backend identifier for error messages.
const BACKEND: &str = "Redb";

/// Table holding the records of one namespace.
const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Catalog store backed by redb.
pub struct RedbStore {
    root: PathBuf,
    handles: HashMap<String, Database>,
}

impl RedbStore {
    /// Open a store rooted at `root`, creating the directory if missing.
    ///
    /// No namespace is opened yet; that happens on first access.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::NotADirectory`] if `root` exists but is not
    /// a directory, or [`StoreErrorKind::Io`] if it cannot be created.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        match fs::metadata(root) {
            Ok(meta) if !meta.is_dir() => {
                return Err(StoreError::new(StoreErrorKind::NotADirectory)
                    .with_backend(BACKEND)
                    .with_namespace(root.display().to_string()));
            }
            Ok(_) => {}
            Err(_) => {
                fs::create_dir_all(root)
                    .map_err(|e| StoreError::io(e).with_backend(BACKEND))?;
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            handles: HashMap::new(),
        })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the namespaces opened so far.
    #[must_use]
    pub fn open_namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the database handle for a namespace, opening it on first use.
    fn database(&mut self, namespace: &str) -> Result<&Database, StoreError> {
        validate_namespace(namespace).map_err(|e| e.with_backend(BACKEND))?;

        match self.handles.entry(namespace.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.root.join(format!("{namespace}.redb"));
                let db = Database::create(&path)
                    .map_err(|e| backend_error(e).with_namespace(namespace))?;
                tracing::debug!(namespace, path = %path.display(), "Opened namespace");
                Ok(entry.insert(db))
            }
        }
    }
}

impl CatalogStore for RedbStore {
    fn put_bytes(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let db = self.database(namespace)?;
        let context = |e: StoreError| e.with_namespace(namespace).with_key(key);

        let txn = db.begin_write().map_err(|e| context(backend_error(e)))?;
        {
            let mut table = txn
                .open_table(RECORDS)
                .map_err(|e| context(backend_error(e)))?;
            table
                .insert(key, value)
                .map_err(|e| context(backend_error(e)))?;
        }
        txn.commit().map_err(|e| context(backend_error(e)))?;
        Ok(())
    }

    fn get_bytes(&mut self, namespace: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let db = self.database(namespace)?;
        let context = |e: StoreError| e.with_namespace(namespace).with_key(key);

        let txn = db.begin_read().map_err(|e| context(backend_error(e)))?;
        let table = match txn.open_table(RECORDS) {
            Ok(table) => table,
            // Nothing was ever written to this namespace.
            Err(redb::TableError::TableDoesNotExist(_)) => {
                return Err(StoreError::not_found(namespace, key).with_backend(BACKEND));
            }
            Err(e) => return Err(context(backend_error(e))),
        };

        let value = table.get(key).map_err(|e| context(backend_error(e)))?;
        value
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StoreError::not_found(namespace, key).with_backend(BACKEND))
    }

    fn exists(&mut self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        match self.get_bytes(namespace, key) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StoreError> {
        let db = self.database(namespace)?;
        let context = |e: StoreError| e.with_namespace(namespace).with_key(key);

        let txn = db.begin_write().map_err(|e| context(backend_error(e)))?;
        {
            let mut table = txn
                .open_table(RECORDS)
                .map_err(|e| context(backend_error(e)))?;
            table.remove(key).map_err(|e| context(backend_error(e)))?;
        }
        txn.commit().map_err(|e| context(backend_error(e)))?;
        Ok(())
    }

    fn scan(&mut self, namespace: &str) -> Result<Vec<RawRecord>, StoreError> {
        let db = self.database(namespace)?;
        let context = |e: StoreError| e.with_namespace(namespace);

        let txn = db.begin_read().map_err(|e| context(backend_error(e)))?;
        let table = match txn.open_table(RECORDS) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(context(backend_error(e))),
        };

        let mut records = Vec::new();
        for item in table.iter().map_err(|e| context(backend_error(e)))? {
            let (key, value) = item.map_err(|e| context(backend_error(e)))?;
            records.push(RawRecord {
                key: key.value().to_owned(),
                value: value.value().to_vec(),
            });
        }
        Ok(records)
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("root", &self.root)
            .field("namespaces", &self.open_namespaces())
            .finish()
    }
}

/// Convert any redb error into a [`StoreError`], keeping I/O failures distinct.
fn backend_error(err: impl Into<redb::Error>) -> StoreError {
    match err.into() {
        redb::Error::Io(io) => StoreError::io(io).with_backend(BACKEND),
        other => StoreError::new(StoreErrorKind::Backend)
            .with_backend(BACKEND)
            .with_source(other),
    }
}
