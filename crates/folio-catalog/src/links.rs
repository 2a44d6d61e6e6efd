//! Link synthesis.
//!
//! Pure functions computing the protocol links of feeds and entries. The
//! result depends only on the feed address, the feed kind, the pagination
//! context and the flags stored on records.
//!
//! Feed link order is fixed: stored links, `self`, then for paginated feeds
//! `start`, `end`, optional `prev`, optional `next`, and finally `search`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::model::{BookRecord, FeedKind, Link, SortKey};

pub const REL_SELF: &str = "self";
pub const REL_START: &str = "start";
pub const REL_END: &str = "end";
pub const REL_PREV: &str = "prev";
pub const REL_NEXT: &str = "next";
pub const REL_SEARCH: &str = "search";
pub const REL_ACQUISITION: &str = "http://opds-spec.org/acquisition";
pub const REL_IMAGE: &str = "http://opds-spec.org/image";
pub const REL_THUMBNAIL: &str = "http://opds-spec.org/image/thumbnail";

pub const NAVIGATION_TYPE: &str = "application/atom+xml;profile=opds-catalog;kind=navigation";
pub const ACQUISITION_TYPE: &str = "application/atom+xml;profile=opds-catalog;kind=acquisition";
pub const ATOM_TYPE: &str = "application/atom+xml";
pub const EPUB_TYPE: &str = "application/epub+zip";

/// Name prefix of synthesized search feeds.
pub const SEARCH_PREFIX: &str = "search:";
/// Name prefix of synthesized single-book feeds.
pub const BOOK_PREFIX: &str = "book:";

const URN_PREFIX: &str = "urn:uuid:";

/// Characters escaped inside a query-string value.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

/// Characters escaped inside a path segment.
const PATH_SEGMENT: &AsciiSet = &QUERY_VALUE.add(b'/');

/// Present a stored id with the URN prefix.
///
/// Ids that already carry the prefix are returned unchanged, so the prefix
/// appears exactly once however often this is applied.
#[must_use]
pub fn urn_id(id: &str) -> String {
    if id.starts_with(URN_PREFIX) {
        id.to_owned()
    } else {
        format!("{URN_PREFIX}{id}")
    }
}

/// Logical address of a feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedAddress<'a> {
    /// `search:<query>`
    Search(&'a str),
    /// `book:<id>`
    Book(&'a str),
    /// Any other name, looked up in the navigation namespace.
    Named(&'a str),
}

impl<'a> FeedAddress<'a> {
    /// Classify a feed name by its reserved prefix.
    #[must_use]
    pub fn parse(name: &'a str) -> Self {
        if let Some(query) = name.strip_prefix(SEARCH_PREFIX) {
            Self::Search(query)
        } else if let Some(id) = name.strip_prefix(BOOK_PREFIX) {
            Self::Book(id)
        } else {
            Self::Named(name)
        }
    }

    /// Transport path of this feed.
    #[must_use]
    pub fn href(&self) -> String {
        match self {
            Self::Search(query) => format!("/search?q={}", utf8_percent_encode(query, QUERY_VALUE)),
            Self::Book(id) => format!("/book?id={}", utf8_percent_encode(id, QUERY_VALUE)),
            Self::Named(name) => catalog_path(name),
        }
    }
}

/// Whether a name uses one of the reserved prefixes.
#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(SEARCH_PREFIX) || name.starts_with(BOOK_PREFIX)
}

/// Catalog path of a named feed.
#[must_use]
pub fn catalog_path(name: &str) -> String {
    format!("/catalog/{}", utf8_percent_encode(name, PATH_SEGMENT))
}

/// Media type of a feed's self link.
#[must_use]
pub fn feed_media_type(kind: FeedKind) -> &'static str {
    match kind {
        FeedKind::Navigation => NAVIGATION_TYPE,
        FeedKind::Acquisition => ACQUISITION_TYPE,
        FeedKind::Search | FeedKind::Unsupported => ATOM_TYPE,
    }
}

/// Pagination state of a feed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageContext {
    /// Explicit sort override carried into every page link.
    pub sort: Option<SortKey>,
    /// Entries per page, greater than zero.
    pub per_page: usize,
    /// Zero-based page number.
    pub page_no: usize,
    /// Number of entries before slicing.
    pub total: usize,
}

impl PageContext {
    /// Index of the last page.
    #[must_use]
    pub fn last_page(&self) -> usize {
        self.total / self.per_page
    }

    /// Whether a page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        (self.page_no + 1).saturating_mul(self.per_page) < self.total
    }

    fn href(&self, base: &str, page_no: usize) -> String {
        let mut href = base.to_owned();
        let mut sep = if base.contains('?') { '&' } else { '?' };
        if let Some(sort) = self.sort {
            href.push_str(&format!("{sep}sort={sort}"));
            sep = '&';
        }
        href.push_str(&format!("{sep}count={}&page={page_no}", self.per_page));
        href
    }
}

/// Append the feed-level links to `links`.
///
/// With a [`PageContext`] the `self` link points at the current page and
/// the navigation relations are added.
pub fn add_feed_links(
    links: &mut Vec<Link>,
    address: &FeedAddress<'_>,
    kind: FeedKind,
    page: Option<&PageContext>,
) {
    let base = address.href();
    let media_type = feed_media_type(kind);

    match page {
        None => links.push(Link::new(REL_SELF, base, media_type)),
        Some(page) => {
            links.push(Link::new(REL_SELF, page.href(&base, page.page_no), media_type));
            links.push(Link::new(REL_START, page.href(&base, 0), media_type));
            links.push(Link::new(REL_END, page.href(&base, page.last_page()), media_type));
            if page.page_no > 0 {
                links.push(Link::new(REL_PREV, page.href(&base, page.page_no - 1), media_type));
            }
            if page.has_next() {
                links.push(Link::new(REL_NEXT, page.href(&base, page.page_no + 1), media_type));
            }
        }
    }

    links.push(search_link());
}

/// Templated search link carried by every feed.
#[must_use]
pub fn search_link() -> Link {
    Link::new(REL_SEARCH, "/search?q={searchTerms}", ATOM_TYPE)
}

/// Acquisition, cover and thumbnail links of a book.
///
/// The payload link is always present; image links follow the stored
/// presence flags.
#[must_use]
pub fn acquisition_links(book: &BookRecord) -> Vec<Link> {
    let mut links = Vec::with_capacity(3);
    links.push(Link::new(
        REL_ACQUISITION,
        format!("/get/books/{}", book.id),
        book.payload_type.as_str(),
    ));
    if book.cover {
        links.push(Link::new(
            REL_IMAGE,
            format!("/get/covers/{}", book.id),
            book.cover_type.as_str(),
        ));
    }
    if book.thumbnail {
        links.push(Link::new(
            REL_THUMBNAIL,
            format!("/get/thumbs/{}", book.id),
            book.thumbnail_type.as_str(),
        ));
    }
    links
}

/// The single link of a navigation-derived entry.
#[must_use]
pub fn navigation_link(category: &str) -> Link {
    Link::new("", catalog_path(category), ATOM_TYPE)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::BookMeta;

    fn rels(links: &[Link]) -> Vec<&str> {
        links.iter().map(|l| l.rel.as_str()).collect()
    }

    fn book(cover: bool, thumbnail: bool) -> BookRecord {
        BookRecord {
            id: "b1".to_owned(),
            meta: BookMeta::default(),
            cover,
            cover_type: "image/jpeg".to_owned(),
            thumbnail,
            thumbnail_type: "image/png".to_owned(),
            payload_type: EPUB_TYPE.to_owned(),
            updated: String::new(),
        }
    }

    #[test]
    fn test_urn_id_applied_once() {
        let once = urn_id("abc");
        assert_eq!(once, "urn:uuid:abc");
        assert_eq!(urn_id(&once), once);
    }

    #[test]
    fn test_feed_address_parse() {
        assert_eq!(FeedAddress::parse("search:dune"), FeedAddress::Search("dune"));
        assert_eq!(FeedAddress::parse("book:b1"), FeedAddress::Book("b1"));
        assert_eq!(FeedAddress::parse("all"), FeedAddress::Named("all"));
        assert_eq!(FeedAddress::parse("search:"), FeedAddress::Search(""));
    }

    #[test]
    fn test_feed_address_href() {
        assert_eq!(FeedAddress::Search("sci fi").href(), "/search?q=sci%20fi");
        assert_eq!(FeedAddress::Book("b1").href(), "/book?id=b1");
        assert_eq!(FeedAddress::Named("all").href(), "/catalog/all");
        assert_eq!(FeedAddress::Named("a/b").href(), "/catalog/a%2Fb");
    }

    #[test]
    fn test_unpaginated_feed_links() {
        let mut links = Vec::new();
        add_feed_links(&mut links, &FeedAddress::Named("root"), FeedKind::Navigation, None);

        assert_eq!(rels(&links), vec!["self", "search"]);
        assert_eq!(links[0].href, "/catalog/root");
        assert_eq!(links[0].media_type, NAVIGATION_TYPE);
        assert_eq!(links[1].href, "/search?q={searchTerms}");
    }

    #[test]
    fn test_stored_links_come_first() {
        let mut links = vec![Link::new("related", "/elsewhere", ATOM_TYPE)];
        add_feed_links(&mut links, &FeedAddress::Named("all"), FeedKind::Acquisition, None);

        assert_eq!(rels(&links), vec!["related", "self", "search"]);
        assert_eq!(links[1].media_type, ACQUISITION_TYPE);
    }

    #[test]
    fn test_search_feed_self_link_is_generic_atom() {
        let mut links = Vec::new();
        add_feed_links(&mut links, &FeedAddress::Search("dune"), FeedKind::Search, None);

        assert_eq!(links[0].href, "/search?q=dune");
        assert_eq!(links[0].media_type, ATOM_TYPE);
    }

    #[test]
    fn test_first_page_links() {
        let page = PageContext {
            sort: Some(SortKey::Title),
            per_page: 2,
            page_no: 0,
            total: 5,
        };
        let mut links = Vec::new();
        add_feed_links(&mut links, &FeedAddress::Named("all"), FeedKind::Acquisition, Some(&page));

        assert_eq!(rels(&links), vec!["self", "start", "end", "next", "search"]);
        assert_eq!(links[0].href, "/catalog/all?sort=title&count=2&page=0");
        assert_eq!(links[2].href, "/catalog/all?sort=title&count=2&page=2");
        assert_eq!(links[3].href, "/catalog/all?sort=title&count=2&page=1");
    }

    #[test]
    fn test_last_page_links() {
        let page = PageContext {
            sort: None,
            per_page: 2,
            page_no: 2,
            total: 5,
        };
        let mut links = Vec::new();
        add_feed_links(&mut links, &FeedAddress::Search("x"), FeedKind::Search, Some(&page));

        assert_eq!(rels(&links), vec!["self", "start", "end", "prev", "search"]);
        assert_eq!(links[0].href, "/search?q=x&count=2&page=2");
        assert_eq!(links[3].href, "/search?q=x&count=2&page=1");
    }

    #[test]
    fn test_has_next_boundaries() {
        let page = |page_no, total| PageContext {
            sort: None,
            per_page: 2,
            page_no,
            total,
        };
        assert!(page(0, 3).has_next());
        assert!(!page(0, 2).has_next());
        assert!(!page(1, 4).has_next());
        assert!(!page(7, 4).has_next());
        assert!(!page(0, 0).has_next());
    }

    #[test]
    fn test_acquisition_links_follow_flags() {
        assert_eq!(rels(&acquisition_links(&book(false, false))), vec![REL_ACQUISITION]);
        assert_eq!(
            rels(&acquisition_links(&book(true, false))),
            vec![REL_ACQUISITION, REL_IMAGE]
        );

        let links = acquisition_links(&book(true, true));
        assert_eq!(rels(&links), vec![REL_ACQUISITION, REL_IMAGE, REL_THUMBNAIL]);
        assert_eq!(links[0].href, "/get/books/b1");
        assert_eq!(links[0].media_type, EPUB_TYPE);
        assert_eq!(links[1].media_type, "image/jpeg");
        assert_eq!(links[2].href, "/get/thumbs/b1");
        assert_eq!(links[2].media_type, "image/png");
    }

    #[test]
    fn test_navigation_link() {
        let link = navigation_link("all");
        assert_eq!(link.rel, "");
        assert_eq!(link.href, "/catalog/all");
        assert_eq!(link.media_type, ATOM_TYPE);
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_name("search:x"));
        assert!(is_reserved_name("book:x"));
        assert!(!is_reserved_name("all"));
    }
}
