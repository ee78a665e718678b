//! Error types for the Quill library.
//!
//! All fallible operations in the crate return [`Result`], whose error type is
//! the [`QuillError`] enum. The enum uses the `thiserror` crate for the
//! `Error` trait implementation and provides convenient constructor methods
//! for the most common error categories.

use std::io;

use thiserror::Error;

/// The main error type for Quill operations.
#[derive(Error, Debug)]
pub enum QuillError {
    /// I/O errors (file operations, staged writes, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors.
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors (lexing, parsing, invalid operators).
    #[error("Query error: {0}")]
    Query(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A chunk on disk has unreadable metadata or a truncated posting stream.
    ///
    /// Distinct from [`QuillError::Io`]: the bytes were read fine, they just
    /// do not form a valid chunk. The affected chunk cannot be loaded.
    #[error("Corrupt chunk '{key}': {reason}")]
    CorruptChunk {
        /// Key of the chunk that failed to load.
        key: String,
        /// What went wrong while decoding it.
        reason: String,
    },

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`QuillError`].
pub type Result<T> = std::result::Result<T, QuillError>;

impl QuillError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        QuillError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        QuillError::Query(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        QuillError::Storage(msg.into())
    }

    /// Create a new corrupt-chunk error.
    pub fn corrupt_chunk<K: Into<String>, S: Into<String>>(key: K, reason: S) -> Self {
        QuillError::CorruptChunk {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        QuillError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = QuillError::index("missing term");
        assert_eq!(error.to_string(), "Index error: missing term");

        let error = QuillError::query("unbalanced parenthesis");
        assert_eq!(error.to_string(), "Query error: unbalanced parenthesis");

        let error = QuillError::corrupt_chunk("term-hello", "truncated key");
        assert_eq!(
            error.to_string(),
            "Corrupt chunk 'term-hello': truncated key"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = QuillError::from(io_error);

        match error {
            QuillError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
