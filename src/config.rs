//! CLI flags and the single required environment variable.
//!
//! The CLI surface is a `bpaf`-derived struct, same as tailsrv's own
//! `-p/--port`, `-q/--quiet` pair (and its `tscat`/`tssync`/`loadtest`
//! companion binaries all follow the same `#[derive(Bpaf)]` shape). The
//! data path itself is deliberately *not* a flag: the spec requires it to
//! come from a single required env var, so a missing value is a
//! configuration error rather than a silently-defaulted CLI option.

use bpaf::Bpaf;
use std::path::PathBuf;
use thiserror::Error;

/// Name of the environment variable naming the data file.
///
/// Carried over verbatim from the original Python implementation
/// (`original_source/old_version/app.py`), which read
/// `os.environ.get("TEXT_FILE_PATH", ...)`.
pub const DATA_PATH_VAR: &str = "TEXT_FILE_PATH";

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct Opts {
    /// The port number on which to listen for new connections
    #[bpaf(short, long, fallback(8080))]
    pub port: u16,

    /// The number of worker processes to pre-fork
    #[bpaf(short, long, fallback(default_worker_count()))]
    pub workers: usize,

    /// Don't produce output unless there's a problem
    #[bpaf(short, long)]
    pub quiet: bool,
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("environment variable {DATA_PATH_VAR} is not set; it must name the data file to serve")]
    MissingDataPath,
    #[error("data file {0:?} does not exist")]
    DataFileMissing(PathBuf),
}

/// Resolves the data file path from [`DATA_PATH_VAR`], failing fatally if
/// it's absent or doesn't point at an existing file.
pub fn data_path() -> Result<PathBuf, Error> {
    let raw = std::env::var(DATA_PATH_VAR).map_err(|_| Error::MissingDataPath)?;
    let path = PathBuf::from(raw);
    if !path.exists() {
        return Err(Error::DataFileMissing(path));
    }
    Ok(path)
}
