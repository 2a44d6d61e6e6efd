//! Book ingestion sources.
//!
//! A [`BookSource`] is an opened book container (EPUB or any other format)
//! exposing metadata and byte streams. The catalog consumes each source
//! exactly once and releases it on every exit path through [`ReleaseGuard`].

use std::io::Read;
use std::ops::{Deref, DerefMut};

use crate::model::BookMeta;

/// Error raised by a book source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Reading the container failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The container is malformed or lacks required parts.
    #[error("Invalid book: {0}")]
    Invalid(String),
}

/// A readable stream with its media type.
pub struct SourceStream<'a> {
    pub media_type: String,
    pub reader: Box<dyn Read + 'a>,
}

impl<'a> SourceStream<'a> {
    /// Wrap a reader.
    pub fn new(media_type: impl Into<String>, reader: impl Read + 'a) -> Self {
        Self {
            media_type: media_type.into(),
            reader: Box::new(reader),
        }
    }
}

impl std::fmt::Debug for SourceStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceStream")
            .field("media_type", &self.media_type)
            .finish_non_exhaustive()
    }
}

/// Capability set of an opened book.
///
/// Additional container formats are additional implementors.
pub trait BookSource {
    /// Descriptive metadata.
    fn metadata(&mut self) -> Result<BookMeta, SourceError>;

    /// Cover image, if the book has one.
    fn cover(&mut self) -> Result<Option<SourceStream<'_>>, SourceError>;

    /// Thumbnail image, if the book has one.
    fn thumbnail(&mut self) -> Result<Option<SourceStream<'_>>, SourceError>;

    /// The book file itself.
    fn payload(&mut self) -> Result<SourceStream<'_>, SourceError>;

    /// Release the container. Called exactly once by the catalog.
    fn release(&mut self);
}

/// Calls [`BookSource::release`] when dropped.
pub struct ReleaseGuard<'a> {
    source: &'a mut dyn BookSource,
}

impl<'a> ReleaseGuard<'a> {
    /// Guard `source` until the end of the scope.
    pub fn new(source: &'a mut dyn BookSource) -> Self {
        Self { source }
    }
}

impl<'a> Deref for ReleaseGuard<'a> {
    type Target = dyn BookSource + 'a;

    fn deref(&self) -> &Self::Target {
        self.source
    }
}

impl DerefMut for ReleaseGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.source
    }
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.source.release();
    }
}
