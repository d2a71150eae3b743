//! Extracting books out of their content archives.
//!
//! Export takes already-resolved [`Book`]s (or a mapping of group keys to
//! library ids, resolved against a [`BookIndex`]), groups them by source
//! content archive so each archive is opened exactly once, and copies each
//! book's entry into the destination directory under a sanitized filename.
//!
//! Archive-level failures (content archive missing, entry missing, copy
//! error) abort the whole call; files written before the failure are left in
//! place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::book::Book;
use crate::error::Result;
use crate::index::BookIndex;

/// Longest title prefix carried into an exported filename.
const MAX_TITLE_CHARS: usize = 100;

lazy_static! {
    // ASCII word characters spelled out: the catalog whitelist deliberately
    // admits only ASCII word characters, whitespace, hyphens and the
    // Cyrillic letters (without Ё/ё).
    static ref NON_WHITELIST: Regex =
        Regex::new(r"[^0-9A-Za-z_\s\-а-яА-Я]+").expect("whitelist pattern is valid");
}

/// Destination filename for a book: the title truncated to
/// [`MAX_TITLE_CHARS`] characters and stripped of non-whitelisted
/// characters, falling back to the stored filename when nothing survives,
/// with the book's extension appended.
#[must_use]
pub fn export_filename(book: &Book) -> String {
    let truncated: String = book.title.chars().take(MAX_TITLE_CHARS).collect();
    let mut name = NON_WHITELIST.replace_all(&truncated, "").into_owned();
    if name.is_empty() {
        name.clone_from(&book.stored_filename);
    }
    format!("{}.{}", name, book.extension)
}

/// Copy `books` out of their content archives into `destination`.
///
/// The destination directory is created if absent. Books are grouped by
/// their metadata's archive name; every archive path resolves against the
/// directory of the **first** book in `books` — one export call assumes all
/// of its books share a source directory, and mixing directories silently
/// resolves against the first one (a compatibility constraint of existing
/// catalogs, kept as-is).
///
/// An empty `books` slice is a no-op.
///
/// # Errors
///
/// Failing to create the destination, open a content archive, open a book's
/// entry, or copy its bytes aborts the whole call. Files written before the
/// failure remain.
pub fn export_books(destination: &Path, books: &[Book]) -> Result<()> {
    if books.is_empty() {
        return Ok(());
    }
    fs::create_dir_all(destination)?;

    let mut by_archive: BTreeMap<&str, Vec<&Book>> = BTreeMap::new();
    for book in books {
        by_archive
            .entry(book.metadata.archive_name.as_str())
            .or_default()
            .push(book);
    }

    let archive_dir = &books[0].metadata.directory;
    for (archive_name, group) in &by_archive {
        let archive_path = archive_dir.join(archive_name);
        debug!(archive = %archive_path.display(), books = group.len(), "exporting from archive");
        copy_group(&archive_path, destination, group)?;
    }
    Ok(())
}

/// Copy one archive's worth of books into `destination`. The archive is
/// opened once for the whole group.
fn copy_group(archive_path: &Path, destination: &Path, books: &[&Book]) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    for book in books {
        let entry_name = format!("{}.{}", book.stored_filename, book.extension);
        let mut entry = archive.by_name(&entry_name)?;
        let mut output = File::create(destination.join(export_filename(book)))?;
        io::copy(&mut entry, &mut output)?;
    }
    Ok(())
}

/// Export books per group: each group key becomes a subdirectory of
/// `destination` holding that group's books.
///
/// Group ids are resolved against `index`; ids with no match are dropped,
/// and a group left with no books is skipped without error.
///
/// # Errors
///
/// Any archive-level failure inside a group aborts the whole call; groups
/// exported before the failure remain on disk.
pub fn export_groups(
    groups: &BTreeMap<String, Vec<String>>,
    destination: &Path,
    index: &BookIndex,
) -> Result<()> {
    for (group, ids) in groups {
        let books = index.resolve(ids);
        if books.is_empty() {
            debug!(group = %group, "no books to export");
            continue;
        }
        export_books(&destination.join(group), &books)?;
        info!(group = %group, count = books.len(), "exported books");
    }
    Ok(())
}
