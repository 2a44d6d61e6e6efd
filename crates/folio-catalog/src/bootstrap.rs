//! Default feed records written when a catalog is first opened.

use folio_store::{CatalogStore, CatalogStoreExt, StoreError};
use uuid::Uuid;

use crate::model::{CatalogCommon, FeedKind, FeedRecord, NAV_NAMESPACE, SortKey};

/// Name of the root navigation feed.
pub const ROOT_FEED: &str = "root";
/// Name of the feed listing every book.
pub const ALL_FEED: &str = "all";

/// Stable bare id of a feed, derived from its name.
#[must_use]
pub fn feed_id(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Build a feed record with a name-derived id.
#[must_use]
pub fn feed_record(
    name: &str,
    title: &str,
    description: &str,
    kind: FeedKind,
    sort: SortKey,
    members: Vec<String>,
) -> FeedRecord {
    FeedRecord {
        common: CatalogCommon {
            id: feed_id(name),
            title: title.to_owned(),
            name: name.to_owned(),
            kind,
            updated: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            author: None,
            links: Vec::new(),
        },
        description: description.to_owned(),
        sort,
        members,
        query: None,
    }
}

/// Feed records that must exist in every catalog.
#[derive(Clone, Debug)]
pub struct CatalogDefaults {
    pub feeds: Vec<FeedRecord>,
}

impl Default for CatalogDefaults {
    /// `root` navigation listing `all`, and `all` listing every book by title.
    fn default() -> Self {
        Self {
            feeds: vec![
                feed_record(
                    ROOT_FEED,
                    "Catalog Root",
                    "Top level catalog",
                    FeedKind::Navigation,
                    SortKey::Title,
                    vec![ALL_FEED.to_owned()],
                ),
                feed_record(
                    ALL_FEED,
                    "All Books",
                    "All books",
                    FeedKind::Acquisition,
                    SortKey::Title,
                    Vec::new(),
                ),
            ],
        }
    }
}

impl CatalogDefaults {
    /// Append an extra feed and list it under the root feed.
    #[must_use]
    pub fn with_feed(mut self, record: FeedRecord) -> Self {
        if let Some(root) = self.feeds.iter_mut().find(|f| f.common.name == ROOT_FEED) {
            add_member(root, &record.common.name);
        }
        self.feeds.push(record);
        self
    }

    /// Write every record whose name is not yet stored. Returns the names
    /// that were created.
    ///
    /// Feeds created here are also added to a root feed stored earlier,
    /// so they stay reachable from the catalog's start page.
    pub fn apply(&self, store: &mut dyn CatalogStore) -> Result<Vec<String>, StoreError> {
        let mut created = Vec::new();
        for record in &self.feeds {
            if store.put_if_absent(NAV_NAMESPACE, &record.common.name, record)? {
                tracing::info!(feed = %record.common.name, "Created default feed");
                created.push(record.common.name.clone());
            }
        }
        link_under_root(store, &created)?;
        Ok(created)
    }
}

/// Add `name` to an explicit member list. An empty list already means
/// every feed, and root never lists itself.
fn add_member(root: &mut FeedRecord, name: &str) -> bool {
    if root.members.is_empty() || name == ROOT_FEED || root.members.iter().any(|m| m == name) {
        return false;
    }
    root.members.push(name.to_owned());
    true
}

fn link_under_root(store: &mut dyn CatalogStore, names: &[String]) -> Result<(), StoreError> {
    if names.iter().all(|n| n == ROOT_FEED) {
        return Ok(());
    }
    let mut root: FeedRecord = match store.get(NAV_NAMESPACE, ROOT_FEED) {
        Ok(root) => root,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };
    let mut changed = false;
    for name in names {
        changed |= add_member(&mut root, name);
    }
    if changed {
        store.put(NAV_NAMESPACE, ROOT_FEED, &root)?;
        tracing::info!(members = ?root.members, "Linked new feeds under root");
    }
    Ok(())
}
