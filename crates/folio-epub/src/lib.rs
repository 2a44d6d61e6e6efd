//! EPUB book source for Folio.
//!
//! [`EpubSource`] opens an EPUB container with the `epub` crate and exposes
//! it as a [`BookSource`]: Dublin Core metadata, the package cover item, a
//! thumbnail from well-known resource ids, and the original file as payload.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use epub::doc::EpubDoc;
use folio_catalog::links::EPUB_TYPE;
use folio_catalog::{Author, BookMeta, BookSource, SourceError, SourceStream};

/// Resource ids publishers commonly use for a thumbnail image.
const THUMBNAIL_IDS: [&str; 3] = ["fcvt", "thumbimagestandard", "thumbnail"];

/// Error returned when an EPUB cannot be opened.
#[derive(Debug, thiserror::Error)]
pub enum EpubError {
    /// The container could not be read or parsed.
    #[error("Cannot open EPUB {}: {message}", path.display())]
    Open { path: PathBuf, message: String },
}

impl From<EpubError> for SourceError {
    fn from(err: EpubError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// An opened EPUB file.
pub struct EpubSource {
    path: PathBuf,
    doc: Option<EpubDoc<BufReader<File>>>,
}

impl EpubSource {
    /// Open and parse the container at `path`.
    pub fn open(path: &Path) -> Result<Self, EpubError> {
        let doc = EpubDoc::new(path).map_err(|e| EpubError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Opened EPUB");
        Ok(Self {
            path: path.to_path_buf(),
            doc: Some(doc),
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn doc(&mut self) -> Result<&mut EpubDoc<BufReader<File>>, SourceError> {
        self.doc
            .as_mut()
            .ok_or_else(|| SourceError::Invalid(format!("{} already released", self.path.display())))
    }

    /// Title used when the package carries none.
    fn fallback_title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl BookSource for EpubSource {
    fn metadata(&mut self) -> Result<BookMeta, SourceError> {
        let fallback = self.fallback_title();
        let doc = self.doc()?;
        let field = |name: &str| {
            doc.mdata(name)
                .map(|m| m.value.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Ok(BookMeta {
            title: field("title").unwrap_or(fallback),
            author: field("creator").map(|name| Author { name, uri: None }),
            publisher: field("publisher"),
            issued: field("date"),
            language: field("language"),
            summary: field("description"),
            rights: field("rights"),
        })
    }

    fn cover(&mut self) -> Result<Option<SourceStream<'_>>, SourceError> {
        let doc = self.doc()?;
        Ok(doc
            .get_cover()
            .map(|(bytes, mime)| SourceStream::new(mime, Cursor::new(bytes))))
    }

    fn thumbnail(&mut self) -> Result<Option<SourceStream<'_>>, SourceError> {
        let doc = self.doc()?;
        for id in THUMBNAIL_IDS {
            if let Some((bytes, mime)) = doc.get_resource(id) {
                return Ok(Some(SourceStream::new(mime, Cursor::new(bytes))));
            }
        }
        Ok(None)
    }

    fn payload(&mut self) -> Result<SourceStream<'_>, SourceError> {
        let file = File::open(&self.path)?;
        Ok(SourceStream::new(EPUB_TYPE, BufReader::new(file)))
    }

    fn release(&mut self) {
        if self.doc.take().is_some() {
            tracing::debug!(path = %self.path.display(), "Released EPUB");
        }
    }
}

/// Open `path` as a boxed [`BookSource`].
pub fn open_source(path: &Path) -> Result<Box<dyn BookSource>, SourceError> {
    Ok(Box::new(EpubSource::open(path)?))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_open_invalid_epub_returns_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"This is not an EPUB").unwrap();

        let err = EpubSource::open(&path).err().unwrap();
        assert!(err.to_string().contains("broken.epub"));
    }

    #[test]
    fn test_open_missing_file_returns_error() {
        let dir = TempDir::new().unwrap();
        assert!(EpubSource::open(&dir.path().join("missing.epub")).is_err());
    }

    #[test]
    fn test_open_error_converts_to_invalid_source() {
        let err = EpubError::Open {
            path: PathBuf::from("a.epub"),
            message: "bad zip".to_owned(),
        };
        let source_err: SourceError = err.into();
        assert!(matches!(source_err, SourceError::Invalid(m) if m.contains("bad zip")));
    }
}
