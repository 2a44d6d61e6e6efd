//! Router construction.
//!
//! Builds the axum router with all routes and the response headers of each
//! route group.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use folio_catalog::Catalog;

use crate::ServerConfig;
use crate::handlers;
use crate::middleware::headers;
use crate::state::AppState;

/// Create the application router for `catalog`.
pub fn create_router(catalog: Arc<Catalog>, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState {
        catalog,
        page_size: config.page_size,
        version: config.version.clone(),
    });

    let feed_routes = Router::new()
        .route("/", get(handlers::feeds::get_root))
        .route("/catalog", get(handlers::feeds::get_root))
        .route("/catalog/{name}", get(handlers::feeds::get_feed))
        .route("/search", get(handlers::feeds::get_search))
        .route("/book", get(handlers::feeds::get_book))
        .route("/get/{kind}/{id}", get(handlers::files::get_file));
    let feed_routes = headers::apply(feed_routes, headers::CATALOG);

    let api_routes = Router::new()
        .route("/api/books", get(handlers::books::list_books))
        .route(
            "/api/books/{id}",
            get(handlers::books::get_book)
                .put(handlers::books::put_book)
                .delete(handlers::books::delete_book),
        )
        .route("/api/feeds", get(handlers::admin::list_feeds))
        .route(
            "/api/feeds/{name}",
            axum::routing::put(handlers::admin::put_feed).delete(handlers::admin::delete_feed),
        );

    let app = Router::new().merge(feed_routes).merge(api_routes);
    headers::apply(app, headers::BASELINE).with_state(state)
}
