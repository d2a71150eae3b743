//! In-memory book index keyed by library id, with a secondary author index.
//!
//! [`BookIndex`] is the catalog store populated by a scan (see
//! [`crate::InpxReader`]) and queried by front-ends. It assumes a single
//! concurrent mutator: `insert` and `clear` must not overlap with reads or
//! with each other, a discipline the caller upholds.
//!
//! # A note on author buckets
//!
//! Re-inserting a book under an existing library id replaces the `by_id`
//! entry (last write wins) but appends to every author bucket again, so a
//! bucket can hold the same book twice. This replication quirk is part of
//! the documented contract of existing catalogs and is preserved on purpose.

use std::collections::{BTreeMap, HashMap};

use crate::book::Book;

/// In-memory associative store of books.
///
/// `by_author` is a `BTreeMap` so that author iteration and author listings
/// come out in ascending key order without re-sorting.
#[derive(Debug, Default)]
pub struct BookIndex {
    by_id: HashMap<String, Book>,
    by_author: BTreeMap<String, Vec<Book>>,
}

impl BookIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert books into the index.
    ///
    /// Each book replaces any previous `by_id` entry under the same library
    /// id and is appended to the bucket of every one of its authors. A book
    /// with no authors is reachable by id only.
    pub fn insert(&mut self, books: impl IntoIterator<Item = Book>) {
        for book in books {
            for author in &book.authors {
                self.by_author
                    .entry(author.clone())
                    .or_default()
                    .push(book.clone());
            }
            self.by_id.insert(book.library_id.clone(), book);
        }
    }

    /// Look up a book by its library id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Book> {
        self.by_id.get(id)
    }

    /// All books in the bucket of an exact author name, in insertion order.
    #[must_use]
    pub fn books_by_author(&self, author: &str) -> &[Book] {
        self.by_author
            .get(author)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Search author names.
    ///
    /// An empty query returns every author key in ascending order. Otherwise
    /// the query is lowercased and split on single spaces; an author matches
    /// when its lowercased name contains every token as a substring. Matches
    /// are returned in descending lexicographic order.
    #[must_use]
    pub fn search_authors(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return self.by_author.keys().cloned().collect();
        }
        let query = query.to_lowercase();
        let tokens: Vec<&str> = query.split(' ').collect();
        // Keys iterate in ascending order; reversing yields the descending
        // order the contract asks for.
        let mut authors: Vec<String> = self
            .by_author
            .keys()
            .filter(|author| {
                let lowered = author.to_lowercase();
                tokens.iter().all(|token| lowered.contains(token))
            })
            .cloned()
            .collect();
        authors.reverse();
        authors
    }

    /// Resolve library ids to owned books; ids with no match are dropped.
    #[must_use]
    pub fn resolve(&self, ids: &[String]) -> Vec<Book> {
        ids.iter()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }

    /// Drop every entry from both maps.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_author.clear();
    }

    /// Number of distinct author buckets.
    #[must_use]
    pub fn author_count(&self) -> usize {
        self.by_author.len()
    }

    /// Number of distinct library ids.
    #[must_use]
    pub fn book_count(&self) -> usize {
        self.by_id.len()
    }

    /// Iterate over `(author, books)` pairs in ascending author order.
    ///
    /// The iterator walks the current snapshot; calling this again restarts
    /// from the beginning. Not safe to use while a mutation is in flight.
    pub fn iter_by_author(&self) -> impl Iterator<Item = (&str, &[Book])> {
        self.by_author
            .iter()
            .map(|(author, books)| (author.as_str(), books.as_slice()))
    }
}
