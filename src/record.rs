//! Decoding of `.inp` index records.
//!
//! An index file holds one record per line. Fields are separated by the
//! control byte `0x04` and each record is terminated by CRLF:
//!
//! ```text
//! AUTHOR;GENRE;TITLE;SERIES;SERNO;FILE;SIZE;LIBID;DEL;EXT;DATE;LANG;LIBRATE;KEYWORDS
//! ```
//!
//! (`;` standing in for the separator byte). Exactly 14 fields are expected;
//! lines with more carry unknown extensions and are decoded from the first
//! 14 only, lines with fewer fail with [`InpxError::MalformedRecord`].
//!
//! [`decode_line`] turns one line into a [`Book`]. [`decode_entry`] decodes a
//! whole index payload, skipping undecodable records so that one bad line
//! never aborts a catalog scan.

use std::borrow::Cow;

use chrono::NaiveDate;
use memchr::memchr_iter;
use tracing::warn;

use crate::book::{Book, BookMetadata};
use crate::error::{InpxError, Result};

/// Field separator byte used inside `.inp` records.
pub const FIELD_SEPARATOR: char = '\x04';

/// Number of positional fields in a well-formed record.
pub const FIELD_COUNT: usize = 14;

const AUTHORS: usize = 0;
const GENRES: usize = 1;
const TITLE: usize = 2;
const SERIES: usize = 3;
const SERIES_NUMBER: usize = 4;
const FILE: usize = 5;
const SIZE: usize = 6;
const LIB_ID: usize = 7;
// Field 8 is the deleted flag; it is not retained.
const EXT: usize = 9;
const DATE: usize = 10;
const LANG: usize = 11;
// Field 12 is the library rating; it is not retained.
const KEYWORDS: usize = 13;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Split a multi-value field on `:`, trimming tokens and dropping empties.
fn split_multi(field: &str) -> Vec<String> {
    field
        .split(':')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Author fields additionally flatten `Surname, Name` into `Surname Name`
/// before trimming, so author keys never contain commas.
fn split_authors(field: &str) -> Vec<String> {
    field
        .split(':')
        .map(|token| token.replace(',', " "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Decode a single index line into a [`Book`].
///
/// The returned book carries default (empty) source-archive metadata; the
/// catalog scan attaches the real metadata afterwards. The display name is
/// computed eagerly before the book is returned.
///
/// # Errors
///
/// Returns [`InpxError::MalformedRecord`] when the line has fewer than
/// [`FIELD_COUNT`] fields, [`InpxError::InvalidSize`] when the size field is
/// not a base-10 integer, and [`InpxError::InvalidDate`] when the date field
/// is not a `YYYY-MM-DD` date. Excess fields beyond [`FIELD_COUNT`] are
/// discarded without error.
pub fn decode_line(line: &str) -> Result<Book> {
    let mut fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < FIELD_COUNT {
        return Err(InpxError::MalformedRecord {
            expected: FIELD_COUNT,
            got: fields.len(),
        });
    }
    fields.truncate(FIELD_COUNT);

    let size_bytes: i64 = fields[SIZE]
        .parse()
        .map_err(|_| InpxError::InvalidSize(fields[SIZE].to_string()))?;
    let date = NaiveDate::parse_from_str(fields[DATE], DATE_FORMAT)
        .map_err(|_| InpxError::InvalidDate(fields[DATE].to_string()))?;

    let mut book = Book {
        metadata: BookMetadata::default(),
        authors: split_authors(fields[AUTHORS]),
        genres: split_multi(fields[GENRES]),
        title: fields[TITLE].to_string(),
        series: fields[SERIES].to_string(),
        series_number: fields[SERIES_NUMBER].to_string(),
        stored_filename: fields[FILE].to_string(),
        size_bytes,
        library_id: fields[LIB_ID].to_string(),
        extension: fields[EXT].to_string(),
        date,
        language: fields[LANG].to_string(),
        keywords: split_multi(fields[KEYWORDS]),
        display_name: String::new(),
    };
    book.display_name = book.compose_display_name();
    Ok(book)
}

/// Decode a whole `.inp` payload into books, attaching `metadata` to each.
///
/// Records that fail to decode are logged and dropped, so the function is
/// infallible: every error [`decode_line`] can produce is record-level and
/// non-fatal to the batch. Payloads that are not valid UTF-8 are decoded as
/// Windows-1251, the encoding of older INPX distributions.
#[must_use]
pub fn decode_entry(payload: &[u8], metadata: &BookMetadata) -> Vec<Book> {
    let text = decode_payload(payload);
    let mut books = Vec::new();
    for line in split_lines(&text) {
        match decode_line(line) {
            Ok(mut book) => {
                book.metadata = metadata.clone();
                books.push(book);
            }
            Err(err) => {
                debug_assert!(err.is_record_level());
                warn!(error = %err, "skipping undecodable record");
            }
        }
    }
    books
}

/// Decode raw index bytes, falling back to Windows-1251 when the payload is
/// not valid UTF-8.
fn decode_payload(payload: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(payload) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1251.decode(payload);
            text
        }
    }
}

/// Split a payload into record lines on `\n`, stripping the `\r` of CRLF
/// terminators. A trailing terminator does not produce an empty final line.
fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    for newline in memchr_iter(b'\n', bytes) {
        lines.push(text[start..newline].trim_end_matches('\r'));
        start = newline + 1;
    }
    if start < bytes.len() {
        lines.push(text[start..].trim_end_matches('\r'));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: char = FIELD_SEPARATOR;

    fn line(fields: &[&str]) -> String {
        fields.join(&SEP.to_string())
    }

    fn well_formed() -> Vec<&'static str> {
        vec![
            "Tolstoy, Leo:Doe, John",
            "classic: novel :",
            "War and Peace",
            "Collected Works",
            "3",
            "100500",
            "2048",
            "lib-42",
            "0",
            "fb2",
            "2019-11-02",
            "ru",
            "5",
            "war : peace",
        ]
    }

    #[test]
    fn decodes_every_field() {
        let book = decode_line(&line(&well_formed())).expect("line must decode");
        assert_eq!(book.authors, vec!["Tolstoy  Leo", "Doe  John"]);
        assert_eq!(book.genres, vec!["classic", "novel"]);
        assert_eq!(book.title, "War and Peace");
        assert_eq!(book.series, "Collected Works");
        assert_eq!(book.series_number, "3");
        assert_eq!(book.stored_filename, "100500");
        assert_eq!(book.size_bytes, 2048);
        assert_eq!(book.library_id, "lib-42");
        assert_eq!(book.extension, "fb2");
        assert_eq!(book.date, NaiveDate::from_ymd_opt(2019, 11, 2).unwrap());
        assert_eq!(book.language, "ru");
        assert_eq!(book.keywords, vec!["war", "peace"]);
        assert_eq!(book.display_name, book.compose_display_name());
    }

    #[test]
    fn authors_commas_become_spaces() {
        let mut fields = well_formed();
        fields[AUTHORS] = "Smith, Anna";
        let book = decode_line(&line(&fields)).expect("line must decode");
        assert_eq!(book.authors, vec!["Smith  Anna"]);
    }

    #[test]
    fn empty_author_field_yields_no_authors() {
        let mut fields = well_formed();
        fields[AUTHORS] = " : : ";
        let book = decode_line(&line(&fields)).expect("line must decode");
        assert!(book.authors.is_empty());
    }

    #[test]
    fn thirteen_fields_is_malformed() {
        let mut fields = well_formed();
        fields.pop();
        let err = decode_line(&line(&fields)).expect_err("13 fields must fail");
        assert!(matches!(
            err,
            InpxError::MalformedRecord {
                expected: FIELD_COUNT,
                got: 13
            }
        ));
    }

    #[test]
    fn fifteen_fields_uses_first_fourteen() {
        let mut fields = well_formed();
        fields.push("surplus");
        let book = decode_line(&line(&fields)).expect("excess fields are discarded");
        assert_eq!(book.keywords, vec!["war", "peace"]);
    }

    #[test]
    fn bad_size_is_rejected() {
        let mut fields = well_formed();
        fields[SIZE] = "2 kilobytes";
        let err = decode_line(&line(&fields)).expect_err("bad size must fail");
        assert!(matches!(err, InpxError::InvalidSize(_)));
    }

    #[test]
    fn bad_date_is_rejected() {
        let mut fields = well_formed();
        fields[DATE] = "02.11.2019";
        let err = decode_line(&line(&fields)).expect_err("bad date must fail");
        assert!(matches!(err, InpxError::InvalidDate(_)));
    }

    #[test]
    fn entry_decoding_skips_bad_records() {
        let metadata = BookMetadata {
            archive_name: "lib1.zip".to_string(),
            directory: "/books".into(),
        };
        let payload = format!(
            "{}\r\nnot a record\r\n{}\r\n",
            line(&well_formed()),
            line(&well_formed())
        );
        let books = decode_entry(payload.as_bytes(), &metadata);
        assert_eq!(books.len(), 2);
        for book in &books {
            assert_eq!(book.metadata, metadata);
        }
    }

    #[test]
    fn entry_decoding_handles_windows_1251_payloads() {
        let mut fields = well_formed();
        fields[TITLE] = "Война и мир";
        let utf8 = format!("{}\r\n", line(&fields));
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1251.encode(&utf8);
        assert!(!had_errors);
        assert!(std::str::from_utf8(&encoded).is_err());

        let books = decode_entry(&encoded, &BookMetadata::default());
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Война и мир");
    }

    #[test]
    fn split_lines_handles_missing_trailing_terminator() {
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb\r\n"), vec!["a", "b"]);
        assert_eq!(split_lines(""), Vec::<&str>::new());
    }
}
