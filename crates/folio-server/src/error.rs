//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_catalog::CatalogError;
use folio_catalog::atom::RenderError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Request parameters were malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Route parameter names nothing servable.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Feed could not be serialized.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking catalog task did not complete.
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// File watcher could not be started.
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Catalog(CatalogError::InvalidFeedName(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = json!({"error": self.to_string()});
        (status, axum::Json(body)).into_response()
    }
}
