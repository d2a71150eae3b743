//! Error types for INPX catalog operations.
//!
//! This module provides the [`InpxError`] type for all library operations
//! and the [`Result`] convenience type.
//!
//! Errors fall into two tiers. Record-level errors ([`InpxError::MalformedRecord`],
//! [`InpxError::InvalidSize`], [`InpxError::InvalidDate`]) describe a single
//! undecodable index line; batch decoding logs and skips such records and keeps
//! going. Archive-level errors (I/O and ZIP failures) are fatal for the
//! enclosing call, which returns immediately without rolling back side effects
//! already produced.

use thiserror::Error;

/// Error type for all INPX catalog operations.
#[derive(Error, Debug)]
pub enum InpxError {
    /// An index line held fewer fields than the record layout requires.
    #[error("malformed record: expected {expected} fields, got {got}")]
    MalformedRecord {
        /// Number of fields the record layout requires.
        expected: usize,
        /// Number of fields actually present on the line.
        got: usize,
    },

    /// The size field of an index line was not a base-10 integer.
    #[error("invalid size field: {0:?}")]
    InvalidSize(String),

    /// The date field of an index line was not a `YYYY-MM-DD` date.
    #[error("invalid date field: {0:?}")]
    InvalidDate(String),

    /// Error from the container or a content archive.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InpxError {
    /// Whether this error describes a single undecodable record rather than
    /// a failure of the enclosing archive operation.
    ///
    /// Record-level errors are recoverable: batch decoding drops the record
    /// and continues with the next line.
    #[must_use]
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            InpxError::MalformedRecord { .. }
                | InpxError::InvalidSize(_)
                | InpxError::InvalidDate(_)
        )
    }
}

/// Convenience type alias for [`std::result::Result`] with [`InpxError`].
pub type Result<T> = std::result::Result<T, InpxError>;
