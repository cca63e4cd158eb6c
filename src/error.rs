//! Centralized error types for mobimeta.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mobimeta library.
#[derive(Error, Debug)]
pub enum MobiError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("MOBI file not found: {0}")]
    FileNotFound(PathBuf),

    /// Fewer bytes were available than a fixed-size field requires.
    #[error("Truncated input reading {context}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// A fixed literal tag did not match.
    #[error("Bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        expected: &'static str,
        found: String,
    },

    /// A declared length or offset is internally inconsistent.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Umbrella for failures while loading a whole MOBI file.
    #[error("Invalid MOBI file '{path}': {reason}")]
    InvalidMobiFile { path: PathBuf, reason: String },

    /// A text record uses a compression scheme this codec cannot decode.
    #[error("Unsupported compression code {0}")]
    UnsupportedCompression(u16),

    /// A record index past the end of the record table.
    #[error("Record index {index} out of range (record count {count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Convenience alias for `Result<T, MobiError>`.
pub type Result<T> = std::result::Result<T, MobiError>;

impl MobiError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a parse failure with the identity of the file being loaded.
    pub fn invalid_file(path: impl Into<PathBuf>, cause: &MobiError) -> Self {
        Self::InvalidMobiFile {
            path: path.into(),
            reason: cause.to_string(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (prefer `MobiError::io` whenever the path is known).
impl From<std::io::Error> for MobiError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
