//! The locked catalog facade.
//!
//! [`Catalog`] owns the store behind a single mutex. Store reads and writes
//! are serialized by that lock. Sidecar files live outside the store under
//! `files/` and are written without it: an ingest only takes the lock to
//! store the finished record, so a slow source never stalls feed requests.
//!
//! # Example
//!
//! ```ignore
//! use folio_catalog::{Catalog, CatalogDefaults, FeedRequest};
//!
//! let catalog = Catalog::open(Path::new(".folio"))?;
//! catalog.bootstrap(&CatalogDefaults::default())?;
//!
//! let feed = catalog.feed(&FeedRequest::new("all").with_page(20, 0))?;
//! println!("{}", folio_catalog::atom::render(&feed)?);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use folio_store::{CatalogStore, CatalogStoreExt, RedbStore, StoreError};
use uuid::Uuid;

use crate::bootstrap::CatalogDefaults;
use crate::error::CatalogError;
use crate::feed::{FeedBuilder, FeedRequest};
use crate::links::is_reserved_name;
use crate::model::{
    BOOKS_NAMESPACE, BookMeta, BookRecord, Feed, FeedRecord, IMPORTS_NAMESPACE, ImportRecord,
    NAV_NAMESPACE,
};
use crate::sidecar::{SidecarKind, SidecarStore, ensure_dir};
use crate::source::{BookSource, ReleaseGuard, SourceStream};

/// Catalog store plus sidecar files, serialized by one lock.
pub struct Catalog {
    store: Mutex<Box<dyn CatalogStore>>,
    files: SidecarStore,
}

impl Catalog {
    /// Open the catalog in `data_dir`.
    ///
    /// Creates `db/` and `files/{books,covers,thumbs}` when missing.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] of kind `NotADirectory` when one of those
    /// paths exists but is a file.
    pub fn open(data_dir: &Path) -> Result<Self, CatalogError> {
        ensure_dir(data_dir)?;
        let store = RedbStore::open(&data_dir.join("db"))?;
        let files = SidecarStore::open(&data_dir.join("files"))?;
        tracing::info!(data_dir = %data_dir.display(), "Opened catalog");
        Ok(Self::with_store(Box::new(store), files))
    }

    /// Build a catalog from an existing store.
    #[must_use]
    pub fn with_store(store: Box<dyn CatalogStore>, files: SidecarStore) -> Self {
        Self {
            store: Mutex::new(store),
            files,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn CatalogStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write default feed records that are not yet stored.
    pub fn bootstrap(&self, defaults: &CatalogDefaults) -> Result<Vec<String>, CatalogError> {
        let mut store = self.lock();
        Ok(defaults.apply(&mut **store)?)
    }

    /// Build a feed.
    pub fn feed(&self, request: &FeedRequest) -> Result<Feed, CatalogError> {
        let mut store = self.lock();
        FeedBuilder::new(&mut **store).build(request)
    }

    /// Fetch one book.
    pub fn book(&self, id: &str) -> Result<BookRecord, CatalogError> {
        let mut store = self.lock();
        store
            .get::<BookRecord>(BOOKS_NAMESPACE, id)
            .map_err(|e| not_found_as(e, || CatalogError::BookNotFound(id.to_owned())))
    }

    /// Every book that decodes, in key order.
    pub fn books(&self) -> Result<Vec<BookRecord>, CatalogError> {
        let mut store = self.lock();
        let mut books = Vec::new();
        for raw in store.scan(BOOKS_NAMESPACE)? {
            match raw.decode(BOOKS_NAMESPACE) {
                Ok(book) => books.push(book),
                Err(e) => tracing::warn!(key = %raw.key, error = %e, "Skipping undecodable book"),
            }
        }
        Ok(books)
    }

    /// Ingest a book from `source` and return its new id.
    ///
    /// Sidecars are written before the record, outside the store lock. If
    /// anything fails after a sidecar was written, the written sidecars are
    /// removed again. The source is released exactly once whatever the
    /// outcome.
    pub fn add_book(&self, source: &mut dyn BookSource) -> Result<String, CatalogError> {
        let mut source = ReleaseGuard::new(source);
        let id = Uuid::new_v4().to_string();

        let result = self.copy_book(&mut *source, &id).and_then(|record| {
            self.lock().put(BOOKS_NAMESPACE, &id, &record)?;
            Ok(record)
        });
        match result {
            Ok(record) => {
                tracing::info!(id = %id, title = %record.meta.title, "Added book");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Book ingestion failed, cleaning up");
                if let Err(cleanup) = self.files.remove_all(&id) {
                    tracing::warn!(id = %id, error = %cleanup, "Cleanup after failed ingestion incomplete");
                }
                Err(e)
            }
        }
    }

    /// Read metadata and copy every stream of `source` into sidecars.
    fn copy_book(
        &self,
        source: &mut dyn BookSource,
        id: &str,
    ) -> Result<BookRecord, CatalogError> {
        let meta = source.metadata()?;

        let thumbnail_type = self.copy_optional(SidecarKind::Thumbnail, id, source.thumbnail()?)?;
        let cover_type = self.copy_optional(SidecarKind::Cover, id, source.cover()?)?;
        let mut payload = source.payload()?;
        self.files.write(SidecarKind::Book, id, &mut payload.reader)?;

        Ok(BookRecord {
            id: id.to_owned(),
            meta,
            cover: cover_type.is_some(),
            cover_type: cover_type.unwrap_or_default(),
            thumbnail: thumbnail_type.is_some(),
            thumbnail_type: thumbnail_type.unwrap_or_default(),
            payload_type: payload.media_type,
            updated: now(),
        })
    }

    /// Write an optional stream. Returns its media type when written.
    fn copy_optional(
        &self,
        kind: SidecarKind,
        id: &str,
        stream: Option<SourceStream<'_>>,
    ) -> Result<Option<String>, CatalogError> {
        let Some(mut stream) = stream else {
            return Ok(None);
        };
        self.files.write(kind, id, &mut stream.reader)?;
        Ok(Some(stream.media_type))
    }

    /// Replace the metadata of a book, keeping its files.
    pub fn update_book(&self, id: &str, meta: BookMeta) -> Result<BookRecord, CatalogError> {
        let mut store = self.lock();
        let mut record = store
            .get::<BookRecord>(BOOKS_NAMESPACE, id)
            .map_err(|e| not_found_as(e, || CatalogError::BookNotFound(id.to_owned())))?;
        record.meta = meta;
        record.updated = now();
        store.put(BOOKS_NAMESPACE, id, &record)?;
        tracing::info!(id, "Updated book");
        Ok(record)
    }

    /// Delete a book and its files. Deleting a missing book is not an error.
    pub fn delete_book(&self, id: &str) -> Result<(), CatalogError> {
        let mut store = self.lock();
        store.delete(BOOKS_NAMESPACE, id)?;
        self.files.remove_all(id)?;
        tracing::info!(id, "Deleted book");
        Ok(())
    }

    /// Book already imported from content with this digest.
    ///
    /// Ledger entries whose book has since been deleted do not count.
    pub fn imported_book(&self, digest: &str) -> Result<Option<String>, CatalogError> {
        let mut store = self.lock();
        let record = match store.get::<ImportRecord>(IMPORTS_NAMESPACE, digest) {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if store.exists(BOOKS_NAMESPACE, &record.book_id)? {
            Ok(Some(record.book_id))
        } else {
            Ok(None)
        }
    }

    /// Remember that content with `digest` was imported as `book_id`.
    pub fn record_import(
        &self,
        digest: &str,
        book_id: &str,
        file_name: &str,
    ) -> Result<(), CatalogError> {
        let record = ImportRecord {
            book_id: book_id.to_owned(),
            file_name: file_name.to_owned(),
            imported: now(),
        };
        self.lock().put(IMPORTS_NAMESPACE, digest, &record)?;
        Ok(())
    }

    /// Every feed record that decodes, in name order.
    pub fn feeds(&self) -> Result<Vec<FeedRecord>, CatalogError> {
        let mut store = self.lock();
        let mut feeds = Vec::new();
        for raw in store.scan(NAV_NAMESPACE)? {
            match raw.decode(NAV_NAMESPACE) {
                Ok(feed) => feeds.push(feed),
                Err(e) => tracing::warn!(key = %raw.key, error = %e, "Skipping undecodable feed"),
            }
        }
        Ok(feeds)
    }

    /// Create or replace a feed definition under its name.
    pub fn put_feed(&self, record: &FeedRecord) -> Result<(), CatalogError> {
        let name = &record.common.name;
        if name.is_empty() || is_reserved_name(name) {
            return Err(CatalogError::InvalidFeedName(name.clone()));
        }
        let mut store = self.lock();
        store.put(NAV_NAMESPACE, name, record)?;
        tracing::info!(feed = %name, kind = %record.common.kind, "Stored feed");
        Ok(())
    }

    /// Delete a feed definition.
    pub fn delete_feed(&self, name: &str) -> Result<(), CatalogError> {
        if name.is_empty() || is_reserved_name(name) {
            return Err(CatalogError::InvalidFeedName(name.to_owned()));
        }
        let mut store = self.lock();
        if !store.exists(NAV_NAMESPACE, name)? {
            return Err(CatalogError::FeedNotFound(name.to_owned()));
        }
        store.delete(NAV_NAMESPACE, name)?;
        tracing::info!(feed = name, "Deleted feed");
        Ok(())
    }

    /// Path and media type of a book's sidecar file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::BookNotFound`] when the book does not exist
    /// or does not carry that kind of file.
    pub fn sidecar(&self, kind: SidecarKind, id: &str) -> Result<(PathBuf, String), CatalogError> {
        let book = self.book(id)?;
        let media_type = match kind {
            SidecarKind::Book => Some(book.payload_type),
            SidecarKind::Cover => book.cover.then_some(book.cover_type),
            SidecarKind::Thumbnail => book.thumbnail.then_some(book.thumbnail_type),
        };
        let path = self.files.path(kind, id);
        match (path, media_type) {
            (Some(path), Some(media_type)) => Ok((path, media_type)),
            _ => Err(CatalogError::BookNotFound(format!("{kind}/{id}"))),
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

fn not_found_as(err: StoreError, not_found: impl FnOnce() -> CatalogError) -> CatalogError {
    if err.is_not_found() {
        not_found()
    } else {
        err.into()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
