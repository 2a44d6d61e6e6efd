//! Relevance search over the books namespace.
//!
//! Every book is scored against the query with a deterministic heuristic:
//! each searchable field (summary, title, author name, content) that
//! contains the whole query costs the book one point per query token, and
//! every token found in a field costs one more. Lower scores are better
//! matches; a score of 0 means no match. There is no index; every search is
//! a full scan.

use folio_store::{CatalogStore, StoreError};

use crate::feed::book_entry;
use crate::model::{BOOKS_NAMESPACE, BookRecord, Entry};

/// Result of a search.
#[derive(Debug, Default)]
pub struct SearchHits {
    /// Matching entries with acquisition links, unsorted.
    pub entries: Vec<Entry>,
    /// Records skipped because they could not be decoded.
    pub warnings: Vec<String>,
}

/// Score `entry` against `query`.
///
/// Returns 0 when nothing matches, otherwise a negative score.
#[must_use]
pub fn score(query: &str, entry: &Entry) -> i64 {
    let query = query.to_uppercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.is_empty() {
        return 0;
    }
    let token_count = i64::try_from(tokens.len()).unwrap_or(i64::MAX);

    let mut fields = vec![
        entry.meta.summary.as_deref().unwrap_or_default().to_uppercase(),
        entry.meta.title.to_uppercase(),
    ];
    if let Some(author) = &entry.meta.author {
        fields.push(author.name.to_uppercase());
    }
    if let Some(content) = &entry.content {
        fields.push(content.text.to_uppercase());
    }

    let mut score = 0i64;
    for field in &fields {
        if field.contains(query.as_str()) {
            score -= token_count;
        }
        for token in &tokens {
            if field.contains(token) {
                score -= 1;
            }
        }
    }
    score
}

/// Scan every book and return the ones matching `query`.
///
/// Records that fail to decode are skipped and reported in
/// [`SearchHits::warnings`]. A failing scan aborts the search.
pub fn search(store: &mut dyn CatalogStore, query: &str) -> Result<SearchHits, StoreError> {
    let records = store.scan(BOOKS_NAMESPACE)?;
    let mut hits = SearchHits::default();

    for raw in &records {
        let book: BookRecord = match raw.decode(BOOKS_NAMESPACE) {
            Ok(book) => book,
            Err(e) => {
                tracing::warn!(key = %raw.key, error = %e, "Skipping undecodable book");
                hits.warnings.push(e.to_string());
                continue;
            }
        };

        let mut entry = book_entry(&book);
        entry.order = score(query, &entry);
        if entry.order != 0 {
            hits.entries.push(entry);
        }
    }

    tracing::debug!(query, results = hits.entries.len(), scanned = records.len(), "Search finished");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use folio_store::{CatalogStoreExt, MockStore};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Author, BookMeta, Content};

    fn entry(title: &str, summary: Option<&str>) -> Entry {
        Entry {
            id: "urn:uuid:x".to_owned(),
            meta: BookMeta {
                title: title.to_owned(),
                summary: summary.map(str::to_owned),
                ..BookMeta::default()
            },
            updated: String::new(),
            category: None,
            content: None,
            links: Vec::new(),
            order: 0,
        }
    }

    fn book(id: &str, title: &str, summary: &str) -> BookRecord {
        BookRecord {
            id: id.to_owned(),
            meta: BookMeta {
                title: title.to_owned(),
                summary: Some(summary.to_owned()),
                ..BookMeta::default()
            },
            cover: false,
            cover_type: String::new(),
            thumbnail: false,
            thumbnail_type: String::new(),
            payload_type: "application/epub+zip".to_owned(),
            updated: String::new(),
        }
    }

    #[test]
    fn test_single_field_single_token() {
        let e = entry("Dogs", Some("A story about a cat"));
        assert_eq!(score("cat", &e), -2);
    }

    #[test]
    fn test_two_fields_outrank_one() {
        let e = entry("The Cat", Some("A story about a cat"));
        assert_eq!(score("cat", &e), -4);
    }

    #[test]
    fn test_case_insensitive() {
        let e = entry("DUNE", None);
        assert_eq!(score("dune", &e), -2);
    }

    #[test]
    fn test_multi_token_query() {
        // Whole query hit (-2) plus both tokens (-2).
        let e = entry("Space Opera", None);
        assert_eq!(score("space opera", &e), -4);

        // Only one token present.
        let e = entry("Space Station", None);
        assert_eq!(score("space opera", &e), -1);
    }

    #[test]
    fn test_author_and_content_fields() {
        let mut e = entry("Untitled", None);
        e.meta.author = Some(Author {
            name: "Ursula Le Guin".to_owned(),
            uri: None,
        });
        e.content = Some(Content {
            media_type: "text".to_owned(),
            text: "guin".to_owned(),
        });
        assert_eq!(score("guin", &e), -4);
    }

    #[test]
    fn test_no_match_scores_zero() {
        let e = entry("Dune", Some("Desert planet"));
        assert_eq!(score("ocean", &e), 0);
        assert_eq!(score("", &e), 0);
        assert_eq!(score("   ", &e), 0);
    }

    #[test]
    fn test_score_monotonic_in_matches() {
        let none = entry("Alpha", None);
        let one = entry("Alpha cat", None);
        let two = entry("Alpha cat", Some("cat"));
        assert!(score("cat", &none) > score("cat", &one));
        assert!(score("cat", &one) > score("cat", &two));
    }

    #[test]
    fn test_search_filters_and_links() {
        let mut store = MockStore::new();
        store.put(BOOKS_NAMESPACE, "a", &book("a", "Cat Tales", "cats")).unwrap();
        store.put(BOOKS_NAMESPACE, "b", &book("b", "Dune", "desert")).unwrap();

        let hits = search(&mut store, "cat").unwrap();

        assert_eq!(hits.entries.len(), 1);
        let hit = &hits.entries[0];
        assert_eq!(hit.id, "urn:uuid:a");
        assert_eq!(hit.order, -4);
        assert_eq!(hit.links.len(), 1);
        assert!(hits.warnings.is_empty());
    }

    #[test]
    fn test_search_skips_corrupt_records() {
        let mut store = MockStore::new();
        store.put(BOOKS_NAMESPACE, "a", &book("a", "Cat", "")).unwrap();
        store.put_bytes(BOOKS_NAMESPACE, "bad", b"{broken").unwrap();

        let hits = search(&mut store, "cat").unwrap();

        assert_eq!(hits.entries.len(), 1);
        assert_eq!(hits.warnings.len(), 1);
    }

    #[test]
    fn test_search_scan_failure_aborts() {
        let mut store = MockStore::new();
        store.fail_namespace(BOOKS_NAMESPACE);

        assert!(search(&mut store, "cat").is_err());
    }
}
