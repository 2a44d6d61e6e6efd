//! Feed assembly.
//!
//! [`FeedBuilder`] turns a feed name into an output [`Feed`] in one pass:
//!
//! 1. Resolve the name. `search:<q>` and `book:<id>` synthesize transient
//!    records; any other name is looked up in the `nav` namespace, and a
//!    miss degrades to a search for the literal name.
//! 2. Gather entries by feed kind (navigation children, books, or search
//!    hits).
//! 3. Synthesize feed links, sort, and optionally slice a page.
//!
//! Resolution of listed member ids is best-effort: members that are missing
//! are dropped quietly, members that fail to decode are dropped with a
//! warning on the feed. Failures of a full-namespace scan abort the request.

use std::time::Instant;

use folio_store::{CatalogStore, CatalogStoreExt, StoreError};

use crate::bootstrap::feed_id;
use crate::error::CatalogError;
use crate::links::{FeedAddress, PageContext, acquisition_links, add_feed_links, navigation_link, urn_id};
use crate::model::{
    BOOKS_NAMESPACE, BookMeta, BookRecord, CatalogCommon, Content, Entry, Feed, FeedKind,
    FeedRecord, Members, NAV_NAMESPACE, SortKey,
};
use crate::ordering::{comparator, sort_entries};
use crate::search::search;

/// A feed request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedRequest {
    /// Logical feed name (`root`, `all`, `search:<q>`, `book:<id>`, ...).
    pub name: String,
    /// Sort override. Ignored for search feeds.
    pub sort: Option<SortKey>,
    /// Entries per page; 0 returns every entry.
    pub per_page: usize,
    /// Zero-based page number.
    pub page_no: usize,
}

impl FeedRequest {
    /// Unpaginated request for `name` with the feed's own sort key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Override the sort key.
    #[must_use]
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Request one page.
    #[must_use]
    pub fn with_page(mut self, per_page: usize, page_no: usize) -> Self {
        self.per_page = per_page;
        self.page_no = page_no;
        self
    }
}

/// Builds feeds from a catalog store.
///
/// Borrows the store mutably for the duration of one request; callers hold
/// the catalog lock around it.
pub struct FeedBuilder<'s> {
    store: &'s mut dyn CatalogStore,
}

impl<'s> FeedBuilder<'s> {
    /// Create a builder over `store`.
    pub fn new(store: &'s mut dyn CatalogStore) -> Self {
        Self { store }
    }

    /// Build the feed for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnsupportedFeedType`] for records with an
    /// unknown type tag, and [`CatalogError::Store`] when a lookup or a
    /// full-namespace scan fails.
    pub fn build(&mut self, request: &FeedRequest) -> Result<Feed, CatalogError> {
        let started = Instant::now();
        let address = FeedAddress::parse(&request.name);
        let record = self.resolve(&address)?;

        let mut warnings = Vec::new();
        let mut entries = match record.common.kind {
            FeedKind::Navigation => self.navigation_entries(&record, &mut warnings)?,
            FeedKind::Acquisition => self.book_entries(&record, &mut warnings)?,
            FeedKind::Search => {
                let query = record.query.as_deref().unwrap_or(&record.common.name);
                let hits = search(self.store, query)?;
                warnings.extend(hits.warnings);
                hits.entries
            }
            FeedKind::Unsupported => {
                return Err(CatalogError::UnsupportedFeedType {
                    name: record.common.name,
                    kind: record.common.kind,
                });
            }
        };

        let sort = match record.common.kind {
            FeedKind::Search => SortKey::Relevance,
            _ => request.sort.unwrap_or(record.sort),
        };
        sort_entries(&mut entries, comparator(sort).as_ref());

        let total = entries.len();
        let page = (request.per_page > 0).then(|| PageContext {
            sort: request.sort,
            per_page: request.per_page,
            page_no: request.page_no,
            total,
        });

        let mut links = record.common.links.clone();
        add_feed_links(&mut links, &address, record.common.kind, page.as_ref());

        if let Some(page) = &page {
            let (start, end) = page_bounds(page.per_page, page.page_no, total);
            entries.truncate(end);
            entries.drain(..start);
        }

        let updated = if record.common.updated.is_empty() {
            newest_update(&entries)
        } else {
            record.common.updated.clone()
        };
        let title = match address {
            FeedAddress::Book(_) => entries
                .first()
                .map_or_else(|| record.common.title.clone(), |e| e.meta.title.clone()),
            _ => record.common.title.clone(),
        };

        tracing::debug!(
            feed = %request.name,
            kind = %record.common.kind,
            %sort,
            entries = entries.len(),
            total,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Built feed"
        );

        Ok(Feed {
            common: CatalogCommon {
                id: urn_id(&record.common.id),
                title,
                name: record.common.name,
                kind: record.common.kind,
                updated,
                author: record.common.author,
                links,
            },
            entries,
            total,
            warnings,
        })
    }

    /// Resolve a feed address to a stored or transient record.
    fn resolve(&mut self, address: &FeedAddress<'_>) -> Result<FeedRecord, CatalogError> {
        match *address {
            FeedAddress::Search(query) => Ok(transient_search(&format!("search:{query}"), query)),
            FeedAddress::Book(id) => Ok(FeedRecord {
                common: transient_common(&format!("book:{id}"), id, FeedKind::Acquisition),
                description: String::new(),
                sort: SortKey::Title,
                members: vec![id.to_owned()],
                query: None,
            }),
            FeedAddress::Named(name) => match self.store.get::<FeedRecord>(NAV_NAMESPACE, name) {
                Ok(record) => Ok(record),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(feed = name, "Unknown feed, searching for its name");
                    Ok(transient_search(name, name))
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    fn navigation_entries(
        &mut self,
        record: &FeedRecord,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<Entry>, CatalogError> {
        let children: Vec<FeedRecord> = match record.members() {
            Members::All => scan_all(self.store, NAV_NAMESPACE, warnings)?,
            Members::Listed(ids) => fetch_listed(self.store, NAV_NAMESPACE, ids, warnings),
        };
        Ok(children.iter().map(navigation_entry).collect())
    }

    fn book_entries(
        &mut self,
        record: &FeedRecord,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<Entry>, CatalogError> {
        let books: Vec<BookRecord> = match record.members() {
            Members::All => scan_all(self.store, BOOKS_NAMESPACE, warnings)?,
            Members::Listed(ids) => fetch_listed(self.store, BOOKS_NAMESPACE, ids, warnings),
        };
        Ok(books.iter().map(book_entry).collect())
    }
}

/// Slice bounds of a page, each clamped to `[0, total]`.
#[must_use]
pub fn page_bounds(per_page: usize, page_no: usize, total: usize) -> (usize, usize) {
    if per_page == 0 {
        return (0, total);
    }
    let start = per_page.saturating_mul(page_no);
    let end = start.saturating_add(per_page);
    (start.min(total), end.min(total))
}

/// Decode every record of a namespace, skipping corrupt ones.
fn scan_all<T: serde::de::DeserializeOwned>(
    store: &mut dyn CatalogStore,
    namespace: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<T>, StoreError> {
    let records = store.scan(namespace)?;
    let mut decoded = Vec::with_capacity(records.len());
    for raw in &records {
        match raw.decode(namespace) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                tracing::warn!(namespace, key = %raw.key, error = %e, "Skipping undecodable record");
                warnings.push(e.to_string());
            }
        }
    }
    Ok(decoded)
}

/// Fetch listed keys in order, dropping the ones that fail.
fn fetch_listed<T: serde::de::DeserializeOwned>(
    store: &mut dyn CatalogStore,
    namespace: &str,
    ids: &[String],
    warnings: &mut Vec<String>,
) -> Vec<T> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        match store.get::<T>(namespace, id) {
            Ok(value) => resolved.push(value),
            Err(e) if e.is_not_found() => {
                tracing::debug!(namespace, key = %id, "Dropping missing member");
            }
            Err(e) => {
                tracing::warn!(namespace, key = %id, error = %e, "Dropping unreadable member");
                warnings.push(e.to_string());
            }
        }
    }
    resolved
}

/// Project a feed record into a navigation entry.
pub(crate) fn navigation_entry(record: &FeedRecord) -> Entry {
    Entry {
        id: urn_id(&record.common.id),
        meta: BookMeta {
            title: record.common.title.clone(),
            author: record.common.author.clone(),
            ..BookMeta::default()
        },
        updated: record.common.updated.clone(),
        category: Some(record.common.name.clone()),
        content: Some(Content {
            media_type: "text".to_owned(),
            text: record.description.clone(),
        }),
        links: vec![navigation_link(&record.common.name)],
        order: 0,
    }
}

/// Project a book record into an acquisition entry.
pub(crate) fn book_entry(book: &BookRecord) -> Entry {
    Entry {
        id: urn_id(&book.id),
        meta: book.meta.clone(),
        updated: book.updated.clone(),
        category: None,
        content: None,
        links: acquisition_links(book),
        order: 0,
    }
}

fn transient_common(name: &str, title: &str, kind: FeedKind) -> CatalogCommon {
    CatalogCommon {
        id: feed_id(name),
        title: title.to_owned(),
        name: name.to_owned(),
        kind,
        updated: String::new(),
        author: None,
        links: Vec::new(),
    }
}

fn transient_search(name: &str, query: &str) -> FeedRecord {
    FeedRecord {
        common: transient_common(name, &format!("Search: {query}"), FeedKind::Search),
        description: String::new(),
        sort: SortKey::Relevance,
        members: Vec::new(),
        query: Some(query.to_owned()),
    }
}

/// Latest `updated` value among entries, compared as RFC 3339 timestamps.
fn newest_update(entries: &[Entry]) -> String {
    entries
        .iter()
        .filter_map(|e| {
            chrono::DateTime::parse_from_rfc3339(&e.updated)
                .ok()
                .map(|t| (t, &e.updated))
        })
        .max_by_key(|(t, _)| *t)
        .map(|(_, updated)| updated.clone())
        .unwrap_or_default()
}
