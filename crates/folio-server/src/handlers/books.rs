//! Book metadata API.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use folio_catalog::{BookMeta, BookRecord, Catalog};

use crate::error::ServerError;
use crate::handlers::with_catalog;
use crate::state::AppState;

/// Handle GET /api/books.
pub(crate) async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookRecord>>, ServerError> {
    Ok(Json(with_catalog(&state, Catalog::books).await?))
}

/// Handle GET /api/books/{id}.
pub(crate) async fn get_book(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookRecord>, ServerError> {
    Ok(Json(with_catalog(&state, move |catalog| catalog.book(&id)).await?))
}

/// Handle PUT /api/books/{id}: replace the book's metadata.
pub(crate) async fn put_book(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(meta): Json<BookMeta>,
) -> Result<Json<BookRecord>, ServerError> {
    if meta.title.trim().is_empty() {
        return Err(ServerError::BadRequest("title must not be empty".to_owned()));
    }
    let record = with_catalog(&state, move |catalog| catalog.update_book(&id, meta)).await?;
    Ok(Json(record))
}

/// Handle DELETE /api/books/{id}.
pub(crate) async fn delete_book(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ServerError> {
    with_catalog(&state, move |catalog| catalog.delete_book(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
