//! Extension trait for [`CatalogStore`] with typed JSON methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::{CatalogStore, StoreError, StoreErrorKind};

/// Typed convenience methods for [`CatalogStore`].
///
/// Implemented as default methods on an extension trait so that
/// [`CatalogStore`] stays object-safe and implementors only handle raw
/// bytes, while callers (including `dyn CatalogStore`) get typed access via
/// the blanket impl.
pub trait CatalogStoreExt: CatalogStore {
    /// Serialize `value` to JSON and write it under `key`.
    fn put<T: Serialize + ?Sized>(
        &mut self,
        namespace: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            StoreError::new(StoreErrorKind::Decode)
                .with_namespace(namespace)
                .with_key(key)
                .with_source(e)
        })?;
        self.put_bytes(namespace, key, &bytes)
    }

    /// Read `key` and decode it as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::NotFound`] if the key is absent and
    /// [`StoreErrorKind::Decode`] if the stored JSON does not match `T`.
    fn get<T: DeserializeOwned>(&mut self, namespace: &str, key: &str) -> Result<T, StoreError> {
        let bytes = self.get_bytes(namespace, key)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::new(StoreErrorKind::Decode)
                .with_namespace(namespace)
                .with_key(key)
                .with_source(e)
        })
    }

    /// Write `value` only when `key` is absent. Returns whether it was written.
    fn put_if_absent<T: Serialize + ?Sized>(
        &mut self,
        namespace: &str,
        key: &str,
        value: &T,
    ) -> Result<bool, StoreError> {
        if self.exists(namespace, key)? {
            return Ok(false);
        }
        self.put(namespace, key, value)?;
        Ok(true)
    }
}

impl<S: CatalogStore + ?Sized> CatalogStoreExt for S {}
