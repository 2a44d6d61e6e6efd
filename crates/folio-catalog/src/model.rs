//! Catalog record model.
//!
//! Persisted records ([`FeedRecord`], [`BookRecord`]) are stored as JSON in
//! the catalog store. Output documents ([`Feed`], [`Entry`]) are built fresh
//! for every request and never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace holding feed definitions.
pub const NAV_NAMESPACE: &str = "nav";

/// Namespace holding book records.
pub const BOOKS_NAMESPACE: &str = "books";

/// Namespace holding the import ledger, keyed by content digest.
pub const IMPORTS_NAMESPACE: &str = "imports";

/// Feed type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Entries link to other feeds.
    Navigation,
    /// Entries are downloadable books.
    Acquisition,
    /// Entries are relevance-ranked search hits.
    Search,
    /// Any tag this version does not know. Rejected at dispatch.
    #[serde(other)]
    Unsupported,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Navigation => "navigation",
            Self::Acquisition => "acquisition",
            Self::Search => "search",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Sort key of a feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Title,
    Author,
    Updated,
    /// Search score, best match first.
    Relevance,
}

/// Error returned when parsing a per-request sort override.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sort key: {0} (expected title, author or updated)")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    /// Parse a request override. Only `title`, `author` and `updated` are
    /// accepted; relevance order is implied by search feeds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "updated" => Ok(Self::Updated),
            other => Err(ParseSortKeyError(other.to_owned())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Updated => "updated",
            Self::Relevance => "relevance",
        })
    }
}

/// Price attached to an acquisition link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// ISO 4217 currency code.
    pub currency: String,
    pub value: String,
}

/// A typed link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Relation; omitted for plain navigation links.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rel: String,
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<Price>,
}

impl Link {
    /// Create a link without prices.
    #[must_use]
    pub fn new(rel: &str, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            rel: rel.to_owned(),
            href: href.into(),
            media_type: media_type.into(),
            prices: Vec::new(),
        }
    }
}

/// Author of a book or feed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Header shared by persisted feed records and output feeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogCommon {
    /// Unique, immutable identifier. Bare in storage, URN-prefixed in output.
    pub id: String,
    pub title: String,
    /// Internal short key. Not rendered.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeedKind,
    #[serde(default)]
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// Membership of a feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Members<'a> {
    /// Every record of the relevant namespace.
    All,
    /// Exactly these keys, in this order.
    Listed(&'a [String]),
}

/// Persisted navigation or acquisition feed definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(flatten)]
    pub common: CatalogCommon,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort: SortKey,
    /// Member keys. Empty means every record of the namespace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    /// Query of a search feed. Defaults to the feed name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl FeedRecord {
    /// Membership of this feed, with empty lists read as "all".
    #[must_use]
    pub fn members(&self) -> Members<'_> {
        if self.members.is_empty() {
            Members::All
        } else {
            Members::Listed(&self.members)
        }
    }
}

/// Descriptive metadata of a book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMeta {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
}

fn default_payload_type() -> String {
    crate::links::EPUB_TYPE.to_owned()
}

/// Persisted book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Bare key, never URN-prefixed in storage.
    pub id: String,
    #[serde(flatten)]
    pub meta: BookMeta,
    /// Whether a cover sidecar exists.
    #[serde(default)]
    pub cover: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cover_type: String,
    /// Whether a thumbnail sidecar exists.
    #[serde(default)]
    pub thumbnail: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thumbnail_type: String,
    #[serde(default = "default_payload_type")]
    pub payload_type: String,
    #[serde(default)]
    pub updated: String,
}

/// Ledger entry for a file that was imported into the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub book_id: String,
    /// File name the book was imported from.
    pub file_name: String,
    pub imported: String,
}

/// Free-text block of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub media_type: String,
    pub text: String,
}

/// One rendered item inside a feed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    /// URN-prefixed identifier.
    pub id: String,
    #[serde(flatten)]
    pub meta: BookMeta,
    pub updated: String,
    /// Navigation grouping name (feed-derived entries only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    pub links: Vec<Link>,
    /// Transient search score. 0 means "not a search hit".
    #[serde(skip)]
    pub order: i64,
}

/// Assembled output document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Feed {
    /// Header with URN-prefixed id.
    #[serde(flatten)]
    pub common: CatalogCommon,
    pub entries: Vec<Entry>,
    /// Number of entries before pagination.
    pub total: usize,
    /// Members dropped because their records could not be decoded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Feed {
    /// First link with the given relation.
    #[must_use]
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.common.links.iter().find(|l| l.rel == rel)
    }
}
