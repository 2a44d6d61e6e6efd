//! Entry ordering.
//!
//! [`EntryComparator`] supports both three-way comparison and the boolean
//! "sorts before" form. [`Compose`] chains comparators so a secondary key
//! breaks ties in the first. Every sort here is stable, so entries with
//! equal keys keep their relative order and page boundaries stay
//! deterministic.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};

use crate::model::{Entry, SortKey};

/// Comparator over output entries.
pub trait EntryComparator {
    /// Three-way comparison.
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering;

    /// Whether `a` sorts strictly before `b`.
    fn sorts_before(&self, a: &Entry, b: &Entry) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Chain of comparators: the first one that tells two entries apart wins.
///
/// Entries that every link considers equal compare equal.
pub struct Compose(Vec<Box<dyn EntryComparator + Send + Sync>>);

impl Compose {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a tie-breaker.
    #[must_use]
    pub fn then<C>(mut self, comparator: C) -> Self
    where
        C: EntryComparator + Send + Sync + 'static,
    {
        self.0.push(Box::new(comparator));
        self
    }
}

impl Default for Compose {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryComparator for Compose {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        self.0
            .iter()
            .map(|c| c.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Case-sensitive lexicographic order on the title.
pub struct ByTitle;

impl EntryComparator for ByTitle {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        a.meta.title.cmp(&b.meta.title)
    }
}

/// Case-sensitive lexicographic order on the author name.
///
/// Entries without an author sort as if the name were empty.
pub struct ByAuthor;

impl EntryComparator for ByAuthor {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        author_name(a).cmp(author_name(b))
    }
}

fn author_name(entry: &Entry) -> &str {
    entry.meta.author.as_ref().map_or("", |a| a.name.as_str())
}

/// Most recently updated first.
///
/// Unparsable timestamps count as the oldest possible value.
pub struct ByUpdated;

impl EntryComparator for ByUpdated {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        parse_timestamp(&b.updated).cmp(&parse_timestamp(&a.updated))
    }
}

/// `None` orders below every parsed timestamp.
fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Ascending search score, most negative (best match) first.
pub struct ByRelevance;

impl EntryComparator for ByRelevance {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        a.order.cmp(&b.order)
    }
}

/// Comparator for a sort key.
///
/// Author order falls back to the title for books by the same author.
#[must_use]
pub fn comparator(key: SortKey) -> Box<dyn EntryComparator + Send + Sync> {
    match key {
        SortKey::Title => Box::new(ByTitle),
        SortKey::Author => Box::new(Compose::new().then(ByAuthor).then(ByTitle)),
        SortKey::Updated => Box::new(ByUpdated),
        SortKey::Relevance => Box::new(ByRelevance),
    }
}

/// Stable in-place sort.
pub fn sort_entries<C: EntryComparator + ?Sized>(entries: &mut [Entry], comparator: &C) {
    entries.sort_by(|a, b| comparator.compare(a, b));
}
