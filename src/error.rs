//! Top-level error type for the startup path.
//!
//! Request-scoped errors never reach here — they're mapped to HTTP
//! statuses inside [`crate::http::route`]. Only conditions that threaten
//! global correctness (missing data, a corrupt index, an unsafe path) end
//! up here, where `main` turns them into a diagnostic on stderr and a
//! process exit code.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] crate::config::Error),

    #[error("{0}")]
    PathSafety(#[from] crate::pathsafety::Error),

    #[error("{0}")]
    Index(#[from] crate::index::Error),

    #[error("{0}")]
    Supervisor(#[from] crate::supervisor::Error),
}

impl Error {
    /// The process exit code this error should produce, per the exit-code
    /// table in SPEC_FULL.md §7.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 1,
            Error::PathSafety(_) => 2,
            Error::Index(_) => 3,
            Error::Supervisor(_) => 4,
        }
    }
}
