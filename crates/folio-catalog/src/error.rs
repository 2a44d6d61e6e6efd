//! Catalog errors.

use folio_store::StoreError;

use crate::model::FeedKind;
use crate::source::SourceError;

/// Error returned by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Store failure (I/O, corrupt record, missing key).
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A feed record with an unknown type tag reached dispatch.
    #[error("Unsupported feed type {kind} for feed {name:?}")]
    UnsupportedFeedType { name: String, kind: FeedKind },
    /// Book does not exist.
    #[error("Book not found: {0}")]
    BookNotFound(String),
    /// Feed definition does not exist.
    #[error("Feed not found: {0}")]
    FeedNotFound(String),
    /// Feed name is empty or uses a reserved prefix.
    #[error("Invalid feed name: {0:?}")]
    InvalidFeedName(String),
    /// Book source failed while reading metadata or streams.
    #[error("Book source error: {0}")]
    Source(#[from] SourceError),
    /// Sidecar file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Whether this error means the requested object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::BookNotFound(_) | Self::FeedNotFound(_) => true,
            Self::Store(e) => e.is_not_found(),
            _ => false,
        }
    }
}
