//! Catalog feed engine for Folio.
//!
//! Turns persisted book and feed records into ordered, paginated,
//! cross-linked feed documents, and answers free-text searches over the
//! library.
//!
//! # Architecture
//!
//! - [`model`]: persisted records and output documents
//! - [`links`]: link synthesis for feeds and entries
//! - [`search`]: relevance scoring over the books namespace
//! - [`ordering`]: entry comparators and stable sorting
//! - [`FeedBuilder`]: name resolution, entry gathering, sorting, pagination
//! - [`atom`]: Atom/OPDS serialization
//! - [`Catalog`]: the store behind one lock, plus book ingestion and
//!   feed administration
//!
//! Records live in two store namespaces: `nav` (feed definitions keyed by
//! name) and `books` (books keyed by bare UUID).

pub mod atom;
mod bootstrap;
mod catalog;
mod error;
mod feed;
pub mod links;
pub mod model;
pub mod ordering;
pub mod search;
mod sidecar;
mod source;

pub use bootstrap::{ALL_FEED, CatalogDefaults, ROOT_FEED, feed_id, feed_record};
pub use catalog::Catalog;
pub use error::CatalogError;
pub use feed::{FeedBuilder, FeedRequest, page_bounds};
pub use model::{
    Author, BookMeta, BookRecord, Entry, Feed, FeedKind, FeedRecord, ImportRecord, Link, SortKey,
};
pub use sidecar::{ParseSidecarKindError, SidecarKind, SidecarStore};
pub use source::{BookSource, ReleaseGuard, SourceError, SourceStream};
