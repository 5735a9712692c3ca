//! Custom error types and result handling for Pagemaster operations.
//!
//! Every fallible operation in the crate returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Stage drivers only return `Err` for stage-level
//! preconditions; failures of a single archive are recorded in the stage report instead.
//!
use std::path::PathBuf;

/// Type alias for Results with Pagemaster errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Pagemaster operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// JSON (de)serialization errors for settings, ledger and title indexes
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Blocking task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::pagemaster::PagemasterConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// A title index that exists but cannot be used
    #[error("Invalid title index '{0:?}': {1}")]
    InvalidIndex(PathBuf, String),
    /// A chapter `entries` pattern that does not compile
    #[error("Invalid entries pattern for chapter '{chapter}' ({pattern:?}): {source}")]
    InvalidPattern {
        chapter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// Error for failed blocking tasks
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    /// Error for resources that couldn't be found (e.g., source directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}
