//! Typed error definitions for relocate.
//! Separates caller misuse (bad policy, bad limits) from environmental failures
//! (filesystem, network) so callers can react differently to each.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something invalid; retrying will not help.
    Misuse,
    /// The filesystem or network failed underneath us.
    Environment,
    /// The user asked us to stop.
    Interrupted,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid conflict policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid concurrency limit {0}; must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("{message}")]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        message: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Operation interrupted by user")]
    Interrupted,
}

/// Failures of a single download task.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Download task for {url} panicked: {message}")]
    TaskPanicked { url: String, message: String },

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPolicy(_) | Error::InvalidConcurrency(_) | Error::NotADirectory(_) => {
                ErrorKind::Misuse
            }
            Error::Filesystem { .. } | Error::Fetch(_) => ErrorKind::Environment,
            Error::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Stable numeric code for structured logs and exit statuses.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidPolicy(_) => 10,
            Error::InvalidConcurrency(_) => 11,
            Error::NotADirectory(_) => 12,
            Error::Filesystem { .. } => 20,
            Error::Fetch(FetchError::Status { .. }) => 30,
            Error::Fetch(FetchError::Transport { .. }) => 31,
            Error::Fetch(FetchError::InvalidUrl(_)) => 32,
            Error::Fetch(FetchError::TaskPanicked { .. }) => 33,
            Error::Fetch(FetchError::ClientSetup(_)) => 34,
            Error::Interrupted => 130,
        }
    }

    /// The underlying io::Error kind, when this is a filesystem failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Filesystem { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
