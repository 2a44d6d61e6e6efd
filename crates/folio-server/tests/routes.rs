//! Router tests: feeds, downloads and the JSON API over an in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use folio_catalog::{
    BookMeta, BookSource, Catalog, CatalogDefaults, SidecarStore, SourceError, SourceStream,
};
use folio_server::{ServerConfig, create_router};
use folio_store::MockStore;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;

const NAVIGATION_TYPE: &str = "application/atom+xml;profile=opds-catalog;kind=navigation";
const ACQUISITION_TYPE: &str = "application/atom+xml;profile=opds-catalog;kind=acquisition";

struct MemoryBook {
    title: &'static str,
    cover: Option<&'static [u8]>,
}

impl BookSource for MemoryBook {
    fn metadata(&mut self) -> Result<BookMeta, SourceError> {
        Ok(BookMeta {
            title: self.title.to_owned(),
            ..BookMeta::default()
        })
    }

    fn cover(&mut self) -> Result<Option<SourceStream<'_>>, SourceError> {
        Ok(self.cover.map(|bytes| SourceStream::new("image/jpeg", bytes)))
    }

    fn thumbnail(&mut self) -> Result<Option<SourceStream<'_>>, SourceError> {
        Ok(None)
    }

    fn payload(&mut self) -> Result<SourceStream<'_>, SourceError> {
        Ok(SourceStream::new("application/epub+zip", &b"PK payload"[..]))
    }

    fn release(&mut self) {}
}

struct Fixture {
    _dir: TempDir,
    catalog: Arc<Catalog>,
    app: Router,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(&ServerConfig {
            version: "test".to_owned(),
            ..ServerConfig::default()
        })
    }

    fn with_config(config: &ServerConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let files = SidecarStore::open(dir.path()).unwrap();
        let catalog = Arc::new(Catalog::with_store(Box::new(MockStore::new()), files));
        catalog.bootstrap(&CatalogDefaults::default()).unwrap();
        let app = create_router(Arc::clone(&catalog), config);
        Self {
            _dir: dir,
            catalog,
            app,
        }
    }

    fn add(&self, title: &'static str, cover: Option<&'static [u8]>) -> String {
        self.catalog
            .add_book(&mut MemoryBook { title, cover })
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_root_serves_navigation_feed() {
    let fixture = Fixture::new();

    let response = fixture.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), NAVIGATION_TYPE);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body = body_string(response).await;
    assert!(body.contains("<title>Catalog Root</title>"));
    assert!(body.contains("<title>All Books</title>"));
}

#[tokio::test]
async fn test_feed_routes_allow_cross_origin_readers() {
    let fixture = Fixture::new();
    let id = fixture.add("Dune", Some(b"jpeg"));

    for uri in ["/catalog/all".to_owned(), format!("/get/covers/{id}")] {
        let response = fixture.get(&uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*", "{uri}");
        assert_eq!(headers.get("access-control-expose-headers").unwrap(), "ETag");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    }
}

#[tokio::test]
async fn test_api_routes_stay_same_origin() {
    let fixture = Fixture::new();

    let response = fixture.get("/api/feeds").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.get("access-control-allow-origin").is_none());
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_named_feed_lists_books_by_title() {
    let fixture = Fixture::new();
    fixture.add("Zebra", None);
    fixture.add("Apple", None);

    let response = fixture.get("/catalog/all").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), ACQUISITION_TYPE);
    let body = body_string(response).await;
    let apple = body.find("Apple").unwrap();
    let zebra = body.find("Zebra").unwrap();
    assert!(apple < zebra);
}

#[tokio::test]
async fn test_pagination_links() {
    let fixture = Fixture::new();
    for title in ["A", "B", "C"] {
        fixture.add(title, None);
    }

    let body = body_string(fixture.get("/catalog/all?count=2&page=0").await).await;

    assert!(body.contains(r#"rel="next" href="/catalog/all?count=2&amp;page=1""#));
    assert!(!body.contains(r#"rel="prev""#));
}

#[tokio::test]
async fn test_invalid_sort_is_bad_request() {
    let fixture = Fixture::new();

    let response = fixture.get("/catalog/all?sort=relevance").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("Unknown sort key"));
}

#[tokio::test]
async fn test_search_ranks_matches() {
    let fixture = Fixture::new();
    fixture.add("Dune Messiah", None);
    fixture.add("Dune", None);
    fixture.add("Neuromancer", None);

    let body = body_string(fixture.get("/search?q=dune").await).await;

    assert!(body.contains("Dune"));
    assert!(!body.contains("Neuromancer"));
}

#[tokio::test]
async fn test_search_without_query_is_bad_request() {
    let fixture = Fixture::new();
    assert_eq!(
        fixture.get("/search").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_book_feed_uses_book_title() {
    let fixture = Fixture::new();
    let id = fixture.add("Solaris", None);

    let body = body_string(fixture.get(&format!("/book?id={id}")).await).await;

    assert!(body.contains("<title>Solaris</title>"));
    assert!(body.contains(&format!("urn:uuid:{id}")));
}

#[tokio::test]
async fn test_etag_not_modified() {
    let fixture = Fixture::new();
    let response = fixture.get("/catalog/all").await;
    let etag = response.headers().get(header::ETAG).unwrap().clone();

    let response = fixture
        .send(
            Request::builder()
                .uri("/catalog/all")
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_sidecar_download() {
    let fixture = Fixture::new();
    let id = fixture.add("Covered", Some(b"jpeg bytes"));

    let response = fixture.get(&format!("/get/covers/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/jpeg");
    assert_eq!(body_string(response).await, "jpeg bytes");

    let response = fixture.get(&format!("/get/books/{id}")).await;
    assert_eq!(content_type(&response), "application/epub+zip");

    assert_eq!(
        fixture.get(&format!("/get/thumbs/{id}")).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        fixture.get(&format!("/get/posters/{id}")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_book_api_update_and_delete() {
    let fixture = Fixture::new();
    let id = fixture.add("Draft", None);

    let response = fixture
        .send(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/books/{id}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title": "Final", "language": "en"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["title"], "Final");
    assert_eq!(json["language"], "en");

    let response = fixture
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/books/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = fixture.get(&format!("/api/books/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_admin_roundtrip() {
    let fixture = Fixture::new();

    let response = fixture
        .send(
            Request::builder()
                .method("PUT")
                .uri("/api/feeds/recent")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"title": "Recently Added", "sort": "updated"}"#,
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(fixture.get("/catalog/recent").await).await;
    assert!(body.contains("<title>Recently Added</title>"));

    let json: serde_json::Value =
        serde_json::from_str(&body_string(fixture.get("/api/feeds").await).await).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["all", "recent", "root"]);

    let response = fixture
        .send(
            Request::builder()
                .method("DELETE")
                .uri("/api/feeds/recent")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_reserved_feed_name_is_bad_request() {
    let fixture = Fixture::new();

    let response = fixture
        .send(
            Request::builder()
                .method("PUT")
                .uri("/api/feeds/search:x")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title": "Nope"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_configured_page_size_applies() {
    let fixture = Fixture::with_config(&ServerConfig {
        page_size: 1,
        ..ServerConfig::default()
    });
    fixture.add("One", None);
    fixture.add("Two", None);

    let body = body_string(fixture.get("/catalog/all").await).await;

    assert!(body.contains("One"));
    assert!(!body.contains("Two"));
    assert!(body.contains(r#"rel="next""#));
}
