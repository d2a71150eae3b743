//! Book entities parsed from INPX index records.
//!
//! This module provides the core data types of the catalog:
//! - [`Book`] — one bibliographic record from an `.inp` index file
//! - [`BookMetadata`] — which content archive holds the book's bytes
//!
//! Books are created by the record decoder (see [`crate::record`]), carry
//! their source-archive metadata once the catalog scan attaches it, and live
//! inside a [`crate::BookIndex`] for the rest of the process lifetime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location of a book's content: the sibling archive holding its bytes and
/// the directory that archive lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// File name of the content archive, e.g. `fb2-100000-200000.zip`.
    pub archive_name: String,
    /// Directory containing both the container and the content archives.
    pub directory: PathBuf,
}

/// A single book record from an INPX catalog.
///
/// Field order mirrors the `.inp` record layout:
/// `AUTHOR;GENRE;TITLE;SERIES;SERNO;FILE;SIZE;LIBID;DEL;EXT;DATE;LANG;LIBRATE;KEYWORDS`
/// with `0x04` standing in for `;`. The deleted flag and the rating are not
/// retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Source-archive metadata, attached during the catalog scan.
    pub metadata: BookMetadata,
    /// Author names, normalized (commas replaced by spaces, trimmed).
    pub authors: Vec<String>,
    /// Genre tags.
    pub genres: Vec<String>,
    /// Book title, verbatim from the record.
    pub title: String,
    /// Series name, possibly empty.
    pub series: String,
    /// Position within the series, kept as text (may be empty or non-numeric).
    pub series_number: String,
    /// Base name of the book's entry inside the content archive.
    pub stored_filename: String,
    /// Uncompressed size in bytes.
    pub size_bytes: i64,
    /// Library-wide stable identifier; the primary key of the index.
    pub library_id: String,
    /// File extension of the stored entry, e.g. `fb2`.
    pub extension: String,
    /// Record date.
    pub date: chrono::NaiveDate,
    /// Language code, e.g. `ru`.
    pub language: String,
    /// Keyword tags.
    pub keywords: Vec<String>,
    /// Human-readable display name, computed eagerly at decode time so that
    /// copies of the book always carry it.
    pub display_name: String,
}

impl Book {
    /// Compose the canonical display name from the book's own fields:
    /// language, date, title, series, series number and size, space-joined.
    ///
    /// The record decoder calls this once per decoded book and stores the
    /// result in [`Book::display_name`].
    #[must_use]
    pub fn compose_display_name(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.language,
            self.date.format("%Y-%m-%d"),
            self.title,
            self.series,
            self.series_number,
            self.size_bytes
        )
    }

    /// Qualify the library id with a caller-chosen prefix, producing the
    /// `prefix:id` form front-ends use as a stable row identifier.
    #[must_use]
    pub fn extended_id(&self, prefix: &str) -> String {
        format!("{}:{}", prefix, self.library_id)
    }
}

/// Recover a plain library id from an extended `prefix:id` identifier.
///
/// Input that does not consist of exactly two colon-separated parts is
/// returned unchanged.
#[must_use]
pub fn id_from_extended(extended: &str) -> &str {
    let parts: Vec<&str> = extended.split(':').collect();
    if parts.len() != 2 {
        return extended;
    }
    parts[1]
}

/// Sort books by their display name, the order front-ends list titles in
/// under an author node.
pub fn sort_books(books: &mut [Book]) {
    books.sort_by(|a, b| a.display_name.cmp(&b.display_name));
}
