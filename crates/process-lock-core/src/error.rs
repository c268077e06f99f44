//! Error types for lock operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The lock state directory could not be created.
    #[error("failed to set up lock directory '{}': {source}", path.display())]
    DirectorySetup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The lock file could not be opened or created.
    #[error("failed to open lock file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A held lock could not be released cleanly.
    #[error("failed to release lock '{}': {source}", path.display())]
    Release {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
