//! Component F — worker bootstrap.
//!
//! Runs once, in the child, immediately after `fork()`. Translated from
//! `original_source/gunicorn_conf.py`'s `post_fork` hook (which calls
//! `app.init_worker()` in the freshly-forked gunicorn worker process) into
//! a plain Rust function: open a fresh descriptor on the data file, open
//! and map the index, and cache the sizes needed to serve requests.
//! Failure here is fatal to the worker (spec.md §4.F) — the caller
//! ([`crate::supervisor`]) logs it and decides whether to respawn.

use crate::http::ServingContext;
use crate::index::{index_path, IndexHandle};
use crate::reader::LineReader;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum Error {
    #[error("worker failed to open index: {0}")]
    Index(#[from] crate::index::Error),
    #[error("worker failed to open data file: {0}")]
    Reader(#[from] crate::reader::Error),
    #[error("worker failed to stat data file {path:?}: {source}")]
    Stat {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Opens a fresh mmap of the index and a fresh descriptor on the data
/// file. This never reuses anything inherited from the master across
/// `fork()` — the design note in spec.md §9 requires each worker to
/// construct its own handle rather than share a global.
pub fn bootstrap(data_path: &Path) -> Result<ServingContext, Error> {
    let index = IndexHandle::open(&index_path(data_path))?;
    let reader = LineReader::open(data_path)?;
    let data_size = std::fs::metadata(data_path)
        .map_err(|source| Error::Stat {
            path: data_path.to_path_buf(),
            source,
        })?
        .len();

    info!(
        target: "server",
        pid = std::process::id(),
        lines = index.len(),
        data_size,
        "worker bootstrapped"
    );

    Ok(ServingContext {
        index,
        reader,
        data_size: AtomicU64::new(data_size),
    })
}
