//! Catalog feed endpoints.
//!
//! Every feed route resolves to a [`FeedRequest`], builds the feed on the
//! blocking pool and answers with the Atom document.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use folio_catalog::links::{BOOK_PREFIX, SEARCH_PREFIX, feed_media_type};
use folio_catalog::{FeedRequest, ROOT_FEED, SortKey, atom};
use md5::{Digest, Md5};
use serde::Deserialize;

use crate::error::ServerError;
use crate::handlers::with_catalog;
use crate::state::AppState;

/// Query parameters shared by the feed routes.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeedParams {
    /// Search terms (`/search` only).
    q: Option<String>,
    /// Book id (`/book` only).
    id: Option<String>,
    /// Sort override: `title`, `author` or `updated`.
    sort: Option<String>,
    /// Entries per page.
    count: Option<usize>,
    /// Zero-based page number.
    page: Option<usize>,
}

impl FeedParams {
    fn into_request(self, name: String, page_size: usize) -> Result<FeedRequest, ServerError> {
        let per_page = self.count.unwrap_or(page_size);
        let mut request = FeedRequest::new(name).with_page(per_page, self.page.unwrap_or(0));
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            let sort = sort
                .parse::<SortKey>()
                .map_err(|e| ServerError::BadRequest(e.to_string()))?;
            request = request.with_sort(sort);
        }
        Ok(request)
    }
}

/// Handle GET / and GET /catalog.
pub(crate) async fn get_root(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let request = params.into_request(ROOT_FEED.to_owned(), state.page_size)?;
    feed_response(&state, request, &headers).await
}

/// Handle GET /catalog/{name}.
pub(crate) async fn get_feed(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let request = params.into_request(name, state.page_size)?;
    feed_response(&state, request, &headers).await
}

/// Handle GET /search?q=.
pub(crate) async fn get_search(
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<FeedParams>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let query = params
        .q
        .take()
        .ok_or_else(|| ServerError::BadRequest("missing query parameter q".to_owned()))?;
    let request = params.into_request(format!("{SEARCH_PREFIX}{query}"), state.page_size)?;
    feed_response(&state, request, &headers).await
}

/// Handle GET /book?id=.
pub(crate) async fn get_book(
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<FeedParams>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let id = params
        .id
        .take()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing query parameter id".to_owned()))?;
    let request = params.into_request(format!("{BOOK_PREFIX}{id}"), state.page_size)?;
    feed_response(&state, request, &headers).await
}

async fn feed_response(
    state: &AppState,
    request: FeedRequest,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let name = request.name.clone();
    let feed = with_catalog(state, move |catalog| catalog.feed(&request)).await?;
    for warning in &feed.warnings {
        tracing::warn!(feed = %name, warning = %warning, "Feed warning");
    }
    let body = atom::render(&feed)?;

    let etag = compute_etag(&state.version, &body);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    Ok((
        [
            (
                header::CONTENT_TYPE,
                feed_media_type(feed.common.kind).to_owned(),
            ),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "no-cache".to_owned()),
        ],
        body,
    )
        .into_response())
}

/// Compute `ETag` from version and content.
///
/// MD5 truncated to 64 bits (16 hex chars).
fn compute_etag(version: &str, content: &str) -> String {
    let hash = Md5::digest(format!("{version}:{content}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}
