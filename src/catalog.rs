//! Scanning INPX container archives into a [`BookIndex`].
//!
//! An INPX container is a ZIP archive whose `.inp` entries each describe the
//! books of one sibling content archive. [`InpxReader`] walks every entry of
//! the container, decodes the index entries (skipping entries it cannot
//! read), derives each entry's companion content-archive name, and inserts
//! the decoded books into a [`BookIndex`].
//!
//! A scan publishes its progress through a [`Progress`] handle: a lock-free
//! 0–100 gauge with a single writer (the reader) and any number of pollers.
//!
//! # Examples
//!
//! ```no_run
//! use inpx::{BookIndex, InpxReader};
//!
//! # fn main() -> inpx::Result<()> {
//! let reader = InpxReader::new("library/catalog.inpx");
//! let mut index = BookIndex::new();
//! let inserted = reader.parse(&mut index)?;
//! println!("{inserted} books indexed");
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::book::BookMetadata;
use crate::error::Result;
use crate::index::BookIndex;
use crate::record;

/// Filename suffix of index entries inside the container.
pub const INDEX_SUFFIX: &str = ".inp";

/// Filename suffix of the sibling content archives.
pub const CONTENT_SUFFIX: &str = ".zip";

/// Shared 0–100 progress gauge for one catalog scan.
///
/// Cloning the handle is cheap and every clone observes the same gauge. The
/// scan is the sole writer; [`Progress::get`] never blocks. The handle is
/// scoped to the [`InpxReader`] that hands it out, not to the process.
#[derive(Debug, Clone, Default)]
pub struct Progress(Arc<AtomicU8>);

impl Progress {
    /// Create a fresh gauge at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, in `[0, 100]`.
    #[must_use]
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, value: u8) {
        self.0.store(value, Ordering::Relaxed);
    }

    /// `floor(done / total * 100)` for a scan that has processed `done` of
    /// `total` entries.
    fn scaled(done: usize, total: usize) -> u8 {
        u8::try_from(done * 100 / total).unwrap_or(100)
    }
}

/// Reader of one INPX container archive.
#[derive(Debug)]
pub struct InpxReader {
    path: PathBuf,
    progress: Progress,
}

impl InpxReader {
    /// Create a reader for the container at `path`. Nothing is opened until
    /// [`InpxReader::parse`] runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_progress(path, Progress::new())
    }

    /// Create a reader publishing to a caller-supplied gauge, letting one
    /// long-lived handle observe successive scans.
    pub fn with_progress(path: impl Into<PathBuf>, progress: Progress) -> Self {
        InpxReader {
            path: path.into(),
            progress,
        }
    }

    /// Path of the container this reader scans.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A handle onto this reader's progress gauge, pollable from another
    /// thread while [`InpxReader::parse`] runs.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    /// Scan the container and insert every decoded book into `index`.
    ///
    /// Entries whose name does not end in [`INDEX_SUFFIX`] are skipped, as
    /// are entries that cannot be read; undecodable records inside an entry
    /// are skipped by the record decoder. Each book's metadata names the
    /// entry's companion content archive (index suffix replaced by
    /// [`CONTENT_SUFFIX`]) and the container's directory.
    ///
    /// The gauge resets to 0 when the call starts and reads 100 once it
    /// returns, on success and on failure alike. Mid-scan it holds
    /// `floor(i / N * 100)` after the index entry at 1-based position `i` of
    /// `N` total container entries has been processed.
    ///
    /// Returns the number of books inserted.
    ///
    /// # Errors
    ///
    /// Failure to open or read the container itself is fatal and returns
    /// immediately; books inserted so far stay in the index.
    pub fn parse(&self, index: &mut BookIndex) -> Result<usize> {
        self.progress.set(0);
        let outcome = self.scan(index);
        self.progress.set(100);
        outcome
    }

    fn scan(&self, index: &mut BookIndex) -> Result<usize> {
        let file = File::open(&self.path)?;
        let mut container = ZipArchive::new(file)?;
        let directory = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let total = container.len();
        let mut inserted = 0;
        for position in 0..total {
            let mut entry = match container.by_index(position) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(position, error = %err, "skipping unreadable container entry");
                    continue;
                }
            };
            let name = entry.name().to_string();
            if !name.ends_with(INDEX_SUFFIX) {
                debug!(entry = %name, "skipping non-index entry");
                continue;
            }

            debug!(entry = %name, "reading index entry");
            let mut payload = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            if let Err(err) = entry.read_to_end(&mut payload) {
                warn!(entry = %name, error = %err, "skipping unreadable index entry");
                continue;
            }

            let metadata = BookMetadata {
                archive_name: content_archive_name(&name),
                directory: directory.clone(),
            };
            let books = record::decode_entry(&payload, &metadata);
            inserted += books.len();
            index.insert(books);

            self.progress.set(Progress::scaled(position + 1, total));
        }
        Ok(inserted)
    }
}

/// Derive the content-archive name for an index entry: the entry's own
/// suffix replaced by [`CONTENT_SUFFIX`], e.g. `fb2-0-100.inp` →
/// `fb2-0-100.zip`.
fn content_archive_name(entry_name: &str) -> String {
    let stem = entry_name
        .strip_suffix(INDEX_SUFFIX)
        .unwrap_or(entry_name);
    format!("{stem}{CONTENT_SUFFIX}")
}
