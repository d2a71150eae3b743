#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Crate layout
//!
//! - [`book`] — Core catalog entities (`Book`, `BookMetadata`)
//! - [`record`] — Decoding `.inp` index records
//! - [`catalog`] — Scanning INPX containers with progress reporting
//! - [`index`] — In-memory book store keyed by library id and author
//! - [`export`] — Copying books out of content archives to disk
//! - [`library`] — Facade wiring the pipeline together for front-ends
//! - [`error`] — Error types and result alias

pub mod book;
pub mod catalog;
pub mod error;
pub mod export;
pub mod index;
pub mod library;
pub mod record;

pub use book::{id_from_extended, sort_books, Book, BookMetadata};
pub use catalog::{InpxReader, Progress, CONTENT_SUFFIX, INDEX_SUFFIX};
pub use error::{InpxError, Result};
pub use export::{export_books, export_filename, export_groups};
pub use index::BookIndex;
pub use library::Library;
pub use record::{decode_entry, decode_line, FIELD_COUNT, FIELD_SEPARATOR};
