//! Error types for rain-grounding.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using rain-grounding's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a corpus or persisting session metrics.
///
/// Extraction, verification and scoring never fail: degenerate input yields an
/// empty result or `0.0`. Only I/O, configuration and session-state violations
/// surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem failure on a document or the metrics log
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document library root does not exist
    #[error("Library path does not exist: {}", path.display())]
    LibraryNotFound { path: PathBuf },

    /// Session already wrote its record
    #[error("Session {session_id} is already finalized")]
    SessionFinalized { session_id: String },
}

impl Error {
    /// Create an I/O error bound to the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a library-not-found error.
    pub fn library_not_found(path: impl Into<PathBuf>) -> Self {
        Self::LibraryNotFound { path: path.into() }
    }

    /// Create a session-finalized error.
    pub fn session_finalized(session_id: impl Into<String>) -> Self {
        Self::SessionFinalized {
            session_id: session_id.into(),
        }
    }
}
