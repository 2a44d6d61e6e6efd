//! HTTP request handlers.

pub(crate) mod admin;
pub(crate) mod books;
pub(crate) mod feeds;
pub(crate) mod files;

use std::sync::Arc;

use folio_catalog::{Catalog, CatalogError};

use crate::error::ServerError;
use crate::state::AppState;

/// Run a catalog call on the blocking pool.
///
/// Catalog calls wait on the store lock and on disk I/O, so they stay off
/// the async workers.
pub(crate) async fn with_catalog<T, F>(state: &AppState, call: F) -> Result<T, ServerError>
where
    F: FnOnce(&Catalog) -> Result<T, CatalogError> + Send + 'static,
    T: Send + 'static,
{
    let catalog = Arc::clone(&state.catalog);
    Ok(tokio::task::spawn_blocking(move || call(&catalog)).await??)
}
