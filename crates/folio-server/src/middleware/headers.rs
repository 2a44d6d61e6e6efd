//! Fixed response headers.
//!
//! Every response carries [`BASELINE`]. Feed and file routes also carry
//! [`CATALOG`], so browser-based OPDS readers served from another origin
//! can fetch feeds and covers and revalidate them by `ETag`.

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

/// Lowercase header names with their values.
pub(crate) type HeaderSet = &'static [(&'static str, &'static str)];

pub(crate) const BASELINE: HeaderSet = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
];

pub(crate) const CATALOG: HeaderSet = &[
    ("access-control-allow-origin", "*"),
    ("access-control-expose-headers", "ETag"),
];

/// Add each header of `headers` to responses of `router` that lack it.
pub(crate) fn apply<S>(router: Router<S>, headers: HeaderSet) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    headers.iter().fold(router, |router, &(name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}
