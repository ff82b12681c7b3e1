//! Error types.

use thiserror::Error;

/// Errors raised by the document engine.
///
/// Apart from [`ModelError::TooLargeForHeapOperation`], these indicate a bug in the caller:
/// continuing after them would leave decorations or version state out of sync with the text,
/// so they are surfaced before anything is mutated.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model has been disposed.
    #[error("model is disposed")]
    Disposed,
    /// A line number outside `1..=line_count`.
    #[error("illegal value for line number: {line_number} (line count is {line_count})")]
    IllegalLineNumber {
        /// The offending line number.
        line_number: usize,
        /// Line count at the time of the call.
        line_count: usize,
    },
    /// Two edit operations in one batch overlap.
    #[error("overlapping ranges are not allowed: {first} and {second}")]
    OverlappingRanges {
        /// First range (in document order).
        first: crate::Range,
        /// Range overlapping the first one.
        second: crate::Range,
    },
    /// Reading the whole document would exceed the configured heap threshold.
    #[error("operation would exceed heap memory limits ({length} > {threshold} code units)")]
    TooLargeForHeapOperation {
        /// Document length in UTF-16 code units.
        length: usize,
        /// Configured threshold.
        threshold: usize,
    },
    /// Search failed.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Search errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provided regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}
