//! Component E — the line reader.
//!
//! Translates a line number into a byte range via the index handle (D),
//! then returns the exact bytes from the data file. Uses `rustix::io::pread`
//! against a single per-worker file descriptor: `pread` takes an explicit
//! offset and never touches a shared seek cursor, so concurrent requests
//! within a worker need no locking — the same property tailsrv's
//! `sendfile`-based forwarding path in `src/librarian.rs`/`src/pool.rs`
//! relies on by giving each client its own tracked offset rather than
//! sharing one.

use crate::index::IndexHandle;
use rustix::fd::OwnedFd;
use rustix::fs::OFlags;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open data file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read data file: {0}")]
    Read(#[source] std::io::Error),
}

/// Either the bytes of a line, or the reason they couldn't be read.
#[derive(Debug)]
pub enum LineResult {
    Ok(Vec<u8>),
    OutOfRange,
}

/// Holds a single open, read-only descriptor to the data file, reused
/// across requests via `pread`.
pub struct LineReader {
    fd: OwnedFd,
    data_path: PathBuf,
}

impl LineReader {
    pub fn open(data_path: &Path) -> Result<LineReader, Error> {
        let fd = rustix::fs::open(
            data_path,
            OFlags::RDONLY | OFlags::CLOEXEC,
            rustix::fs::Mode::empty(),
        )
        .map_err(|e| Error::Open {
            path: data_path.to_path_buf(),
            source: e.into(),
        })?;
        Ok(LineReader {
            fd,
            data_path: data_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.data_path
    }

    /// Reads line `n` given the current data file size, consulting `index`
    /// for its byte range. Returns [`LineResult::OutOfRange`] rather than
    /// an error when `n` is beyond `index.len()` — that's a request-scoped
    /// condition the caller maps to `413`, not an I/O failure.
    pub fn read_line(
        &self,
        index: &IndexHandle,
        data_size: u64,
        n: u64,
    ) -> Result<LineResult, Error> {
        if n >= index.len() {
            return Ok(LineResult::OutOfRange);
        }
        let (start, end) = index.range(n, data_size);
        let len = (end - start) as usize;
        let mut buf = vec![0u8; len];
        let mut read_total = 0usize;
        while read_total < len {
            let n_read = rustix::io::pread(&self.fd, &mut buf[read_total..], start + read_total as u64)
                .map_err(|e| Error::Read(e.into()))?;
            if n_read == 0 {
                // The data file shrank out from under us mid-request; treat
                // the remainder as absent rather than looping forever.
                buf.truncate(read_total);
                break;
            }
            read_total += n_read;
        }
        Ok(LineResult::Ok(buf))
    }
}
