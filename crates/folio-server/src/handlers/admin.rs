//! Feed administration API.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use folio_catalog::{Catalog, FeedKind, FeedRecord, SortKey, feed_record};
use serde::Deserialize;

use crate::error::ServerError;
use crate::handlers::with_catalog;
use crate::state::AppState;

/// Body of PUT /api/feeds/{name}.
#[derive(Debug, Deserialize)]
pub(crate) struct FeedDefinition {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: FeedKind,
    #[serde(default)]
    sort: SortKey,
    /// Empty means every record of the member namespace.
    #[serde(default)]
    members: Vec<String>,
    /// Search terms of a stored search feed. Defaults to the feed name.
    #[serde(default)]
    query: Option<String>,
}

fn default_kind() -> FeedKind {
    FeedKind::Acquisition
}

impl FeedDefinition {
    fn into_record(self, name: &str) -> Result<FeedRecord, ServerError> {
        if self.kind == FeedKind::Unsupported {
            return Err(ServerError::BadRequest(
                "type must be navigation, acquisition or search".to_owned(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(ServerError::BadRequest("title must not be empty".to_owned()));
        }
        let mut record = feed_record(
            name,
            &self.title,
            &self.description,
            self.kind,
            self.sort,
            self.members,
        );
        record.query = self.query;
        Ok(record)
    }
}

/// Handle GET /api/feeds.
pub(crate) async fn list_feeds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FeedRecord>>, ServerError> {
    Ok(Json(with_catalog(&state, Catalog::feeds).await?))
}

/// Handle PUT /api/feeds/{name}.
pub(crate) async fn put_feed(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(definition): Json<FeedDefinition>,
) -> Result<Json<FeedRecord>, ServerError> {
    let record = definition.into_record(&name)?;
    let record = with_catalog(&state, move |catalog| {
        catalog.put_feed(&record)?;
        Ok(record)
    })
    .await?;
    Ok(Json(record))
}

/// Handle DELETE /api/feeds/{name}.
pub(crate) async fn delete_feed(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ServerError> {
    with_catalog(&state, move |catalog| catalog.delete_feed(&name)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_definition_defaults() {
        let definition: FeedDefinition =
            serde_json::from_str(r#"{"title": "Recent"}"#).unwrap();

        let record = definition.into_record("recent").unwrap();

        assert_eq!(record.common.kind, FeedKind::Acquisition);
        assert_eq!(record.sort, SortKey::Title);
        assert!(record.members.is_empty());
        assert_eq!(record.common.id, folio_catalog::feed_id("recent"));
    }

    #[test]
    fn test_definition_rejects_unknown_type() {
        let definition: FeedDefinition =
            serde_json::from_str(r#"{"title": "Odd", "type": "shelf"}"#).unwrap();

        assert!(matches!(
            definition.into_record("odd"),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_definition_keeps_search_query() {
        let definition: FeedDefinition = serde_json::from_str(
            r#"{"title": "Dune", "type": "search", "query": "herbert"}"#,
        )
        .unwrap();

        let record = definition.into_record("dune").unwrap();

        assert_eq!(record.common.kind, FeedKind::Search);
        assert_eq!(record.query.as_deref(), Some("herbert"));
    }
}
