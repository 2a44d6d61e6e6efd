//! Sidecar files stored next to the catalog database.
//!
//! Layout under the files root:
//!
//! ```text
//! files/
//! +-- books/{id}    # book payload
//! +-- covers/{id}   # cover image
//! +-- thumbs/{id}   # thumbnail image
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use folio_store::{StoreError, StoreErrorKind};

/// Kind of sidecar file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SidecarKind {
    Book,
    Cover,
    Thumbnail,
}

impl SidecarKind {
    /// Every kind, in write order.
    pub const ALL: [Self; 3] = [Self::Thumbnail, Self::Cover, Self::Book];

    /// Directory name of this kind.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Book => "books",
            Self::Cover => "covers",
            Self::Thumbnail => "thumbs",
        }
    }
}

impl fmt::Display for SidecarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Error returned for an unknown sidecar directory name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown file kind: {0}")]
pub struct ParseSidecarKindError(pub String);

impl FromStr for SidecarKind {
    type Err = ParseSidecarKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "books" => Ok(Self::Book),
            "covers" => Ok(Self::Cover),
            "thumbs" => Ok(Self::Thumbnail),
            other => Err(ParseSidecarKindError(other.to_owned())),
        }
    }
}

/// File store for book payloads and images, addressed by book id.
#[derive(Clone, Debug)]
pub struct SidecarStore {
    root: PathBuf,
}

impl SidecarStore {
    /// Open the store at `root`, creating the per-kind directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::NotADirectory`] when `root` or one of its
    /// kind directories exists but is a file.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        ensure_dir(root)?;
        for kind in SidecarKind::ALL {
            ensure_dir(&root.join(kind.dir_name()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a sidecar, or `None` when `id` cannot be a book id.
    #[must_use]
    pub fn path(&self, kind: SidecarKind, id: &str) -> Option<PathBuf> {
        is_valid_id(id).then(|| self.root.join(kind.dir_name()).join(id))
    }

    /// Copy `reader` into the sidecar. Returns the number of bytes written.
    pub fn write(&self, kind: SidecarKind, id: &str, reader: &mut dyn Read) -> io::Result<u64> {
        let path = self.path(kind, id).ok_or_else(|| invalid_id(id))?;
        let mut file = File::create(&path)?;
        let written = io::copy(reader, &mut file)?;
        file.sync_all()?;
        tracing::debug!(%kind, id, bytes = written, "Wrote sidecar");
        Ok(written)
    }

    /// Remove a sidecar. Removing a missing file is not an error.
    pub fn remove(&self, kind: SidecarKind, id: &str) -> io::Result<()> {
        let path = self.path(kind, id).ok_or_else(|| invalid_id(id))?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Remove every sidecar of a book, attempting all kinds before
    /// reporting the first failure.
    pub fn remove_all(&self, id: &str) -> io::Result<()> {
        let mut first_error = None;
        for kind in SidecarKind::ALL {
            if let Err(e) = self.remove(kind, id) {
                tracing::warn!(%kind, id, error = %e, "Failed to remove sidecar");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Book ids are generated UUIDs; anything else never names a sidecar.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn invalid_id(id: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid book id: {id:?}"))
}

/// Create `path` as a directory unless it already is one.
pub(crate) fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::new(StoreErrorKind::NotADirectory)
            .with_namespace(path.display().to_string())),
        Err(_) => fs::create_dir_all(path).map_err(StoreError::io),
    }
}
