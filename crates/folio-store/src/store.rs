//! Store trait and error types.
//!
//! Provides the core [`CatalogStore`] trait for namespaced document storage,
//! along with [`StoreError`] for unified error handling across backends.
//!
//! # Namespaces
//!
//! A namespace is an independent ordered key space. Two namespaces never
//! share keys, and iterating one never yields records of another. Namespace
//! names are short identifiers (`nav`, `books`) made of ASCII letters,
//! digits, `-` and `_`.

use serde::de::DeserializeOwned;

/// A raw record returned by [`CatalogStore::scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    /// Record key within its namespace.
    pub key: String,
    /// Stored JSON bytes.
    pub value: Vec<u8>,
}

impl RawRecord {
    /// Decode the stored bytes into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreErrorKind::Decode`] error carrying the record key
    /// (and the given namespace) if the bytes do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, namespace: &str) -> Result<T, StoreError> {
        serde_json::from_slice(&self.value).map_err(|e| {
            StoreError::new(StoreErrorKind::Decode)
                .with_namespace(namespace)
                .with_key(&self.key)
                .with_source(e)
        })
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// Key does not exist in the namespace.
    NotFound,
    /// Stored bytes do not decode into the requested shape.
    Decode,
    /// Storage root exists but is not a directory.
    NotADirectory,
    /// Underlying I/O failure.
    Io,
    /// Namespace name is empty or contains unsupported characters.
    InvalidNamespace,
    /// Backend-specific failure (transaction, table, commit).
    Backend,
}

/// Store error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StoreError {
    /// Semantic error category.
    pub kind: StoreErrorKind,
    /// Namespace context (if applicable).
    pub namespace: Option<String>,
    /// Key context (if applicable).
    pub key: Option<String>,
    /// Backend identifier (e.g., "Redb", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new store error.
    #[must_use]
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            namespace: None,
            key: None,
            backend: None,
            source: None,
        }
    }

    /// Attach namespace context.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Attach key context.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error for a namespaced key.
    #[must_use]
    pub fn not_found(namespace: &str, key: &str) -> Self {
        Self::new(StoreErrorKind::NotFound)
            .with_namespace(namespace)
            .with_key(key)
    }

    /// Create a store error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error) -> Self {
        Self::new(StoreErrorKind::Io).with_source(err)
    }

    /// Whether this error means the key is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }

    /// Whether this error means the stored bytes are corrupt.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        self.kind == StoreErrorKind::Decode
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (books/abc)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StoreErrorKind::NotFound => "Not found",
            StoreErrorKind::Decode => "Decode error",
            StoreErrorKind::NotADirectory => "Not a directory",
            StoreErrorKind::Io => "I/O error",
            StoreErrorKind::InvalidNamespace => "Invalid namespace",
            StoreErrorKind::Backend => "Backend error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        match (&self.namespace, &self.key) {
            (Some(ns), Some(key)) => write!(f, " ({ns}/{key})")?,
            (Some(ns), None) => write!(f, " ({ns})")?,
            (None, Some(key)) => write!(f, " ({key})")?,
            (None, None) => {}
        }

        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Check that a namespace name is usable as an independent key space.
///
/// # Errors
///
/// Returns [`StoreErrorKind::InvalidNamespace`] for empty names or names
/// containing anything but ASCII alphanumerics, `-` and `_`.
pub fn validate_namespace(namespace: &str) -> Result<(), StoreError> {
    let valid = !namespace.is_empty()
        && namespace
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::new(StoreErrorKind::InvalidNamespace).with_namespace(namespace))
    }
}

/// Namespaced document storage.
///
/// Every namespace is an ordered key space. Values are opaque bytes at this
/// level; [`CatalogStoreExt`](crate::CatalogStoreExt) layers JSON encoding on
/// top.
///
/// All methods take `&mut self`: implementations open namespaces lazily and
/// are not safe to share without an external lock.
pub trait CatalogStore: Send {
    /// Write a value, silently overwriting any previous one.
    ///
    /// Readers never observe a partially written value.
    fn put_bytes(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::NotFound`] if the key is absent.
    fn get_bytes(&mut self, namespace: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Check whether a key exists. Fails only on I/O or backend errors.
    fn exists(&mut self, namespace: &str, key: &str) -> Result<bool, StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StoreError>;

    /// Return every record of a namespace in key order.
    ///
    /// Any cursor used for the iteration is released before returning,
    /// on success and on error.
    fn scan(&mut self, namespace: &str) -> Result<Vec<RawRecord>, StoreError>;

    /// Number of records in a namespace; always equals `scan(namespace)?.len()`.
    fn count(&mut self, namespace: &str) -> Result<usize, StoreError> {
        Ok(self.scan(namespace)?.len())
    }
}
