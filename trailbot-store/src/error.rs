//! Storage layer errors

use thiserror::Error;

/// Errors that can occur while persisting trades
#[derive(Debug, Error)]
pub enum StoreError {
    /// Journal file could not be opened or written
    #[error("Journal I/O error on {path}: {message}")]
    Io {
        /// Journal path
        path: String,
        /// Underlying error
        message: String,
    },

    /// In-memory journal lock was poisoned
    #[error("Journal lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Create an I/O error for `path`
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
