//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use folio_catalog::Catalog;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// The catalog behind its store lock.
    pub(crate) catalog: Arc<Catalog>,
    /// Entries per page when a request gives no `count` (0 = unpaginated).
    pub(crate) page_size: usize,
    /// Application version for `ETag` computation.
    pub(crate) version: String,
}
