//! Namespaced key-value catalog store for Folio.
//!
//! This crate provides the [`CatalogStore`] trait: independent, ordered key
//! spaces ("namespaces") holding JSON documents. The catalog keeps feed
//! definitions in one namespace and books in another.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`CatalogStore`] trait with byte-level `put`/`get`/`exists`/`delete`/`scan`
//! - [`CatalogStoreExt`] with typed JSON access via a blanket impl
//! - [`RedbStore`], one redb database file per namespace, opened lazily
//! - [`MockStore`] for testing (behind `mock` feature flag)
//!
//! Stores take `&mut self` for every operation and carry no locking of their
//! own. Callers that share a store across threads wrap it in a single mutex.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use folio_store::{CatalogStore, CatalogStoreExt, RedbStore};
//!
//! let mut store = RedbStore::open(Path::new(".folio/db"))?;
//! store.put("books", "b1", &serde_json::json!({"title": "Dune"}))?;
//! let value: serde_json::Value = store.get("books", "b1")?;
//! assert_eq!(store.count("books")?, 1);
//! ```

mod db;
mod ext;
#[cfg(feature = "mock")]
mod mock;
mod store;

pub use db::RedbStore;
pub use ext::CatalogStoreExt;
#[cfg(feature = "mock")]
pub use mock::MockStore;
pub use store::{CatalogStore, RawRecord, StoreError, StoreErrorKind, validate_namespace};
