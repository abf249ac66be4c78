//! Error types for cabinet parsing and extraction.

use std::io;

use thiserror::Error;

/// Result type for cabinet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while parsing or extracting a cabinet.
///
/// None of these are retried internally.  Files that were already handed to
/// a sink before an extraction failed stay delivered.
#[derive(Error, Debug)]
pub enum Error {
    /// The cabinet violates the format (bad signature, unterminated name,
    /// oversized data block, bad folder reference, ...).
    #[error("Corrupt cabinet at offset {offset}: {reason}")]
    CorruptFormat {
        /// Absolute offset at which the problem was detected.
        offset: u64,
        /// What was wrong.
        reason: String,
    },

    /// The cabinet belongs to a multi-volume set.
    #[error("Spanned cabinets are not supported (header flags {flags:#06x})")]
    UnsupportedSpanning {
        /// The header's option flags.
        flags: u16,
    },

    /// The byte source ran out in the middle of a field or skip.
    #[error("Unexpected end of data at offset {offset}")]
    UnexpectedEndOfData {
        /// Offset at which the truncated field or skip started.
        offset: u64,
    },

    /// A seek would have moved the byte source backwards.
    #[error("Cannot seek backwards from offset {position} to {target}")]
    InvalidSeek {
        /// Current position of the byte source.
        position: u64,
        /// Requested position.
        target: u64,
    },

    /// A folder uses a compression method that has no decoder.
    #[error("Unsupported compression method {method:#06x}")]
    UnsupportedCompression {
        /// The folder's raw compression field.
        method: u16,
    },

    /// A data block failed checksum verification.
    #[error(
        "Checksum error in data block {block} \
         (expected {expected:08x}, actual {actual:08x})"
    )]
    ChecksumMismatch {
        /// Index of the block within its folder.
        block: usize,
        /// Checksum stored in the block header.
        expected: u32,
        /// Checksum computed over the block.
        actual: u32,
    },

    /// A decompressor was asked for data before being initialized for a
    /// folder.
    #[error("Decompressor read before initialization")]
    DecompressorNotInitialized,

    /// `reset` was called on a byte source that has no mark.
    #[error("Cannot reset byte source: no mark has been set")]
    MarkNotSet,

    /// Error reported by the underlying reader.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
