//! Errors that occur while encoding or decoding an SVG table

use thiserror::Error;

/// A structural error in an SVG table.
///
/// Any of these aborts the whole table operation; no partial table is ever
/// produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid glyph range {first}..={last} (previous range ends at {previous_last:?})")]
    InvalidRange {
        first: u16,
        last: u16,
        previous_last: Option<u16>,
    },

    #[error("Document of {length} bytes at offset {offset} does not fit a 32-bit field")]
    DocumentTooLarge { offset: usize, length: usize },

    #[error("Unsupported SVG table version {0}")]
    UnsupportedVersion(u16),

    #[error("SVG table is truncated: {0}")]
    TruncatedTable(&'static str),

    #[error("Document record {index} is out of order or inverted")]
    MalformedDirectory { index: usize },

    #[error("SVG table failed validation: {0}")]
    Validation(String),
}
