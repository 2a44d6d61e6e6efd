//! Sidecar file downloads: book payloads, covers and thumbnails.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use folio_catalog::SidecarKind;

use crate::error::ServerError;
use crate::handlers::with_catalog;
use crate::state::AppState;

/// Handle GET /get/{kind}/{id}.
pub(crate) async fn get_file(
    Path((kind, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ServerError> {
    let kind = kind
        .parse::<SidecarKind>()
        .map_err(|e| ServerError::NotFound(e.to_string()))?;
    let lookup = id.clone();
    let (path, media_type) =
        with_catalog(&state, move |catalog| catalog.sidecar(kind, &lookup)).await?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(%kind, id = %id, path = %path.display(), "Sidecar file missing");
            return Err(ServerError::NotFound(format!("{kind}/{id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, media_type)], bytes).into_response())
}
