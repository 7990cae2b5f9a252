//! The on-disk offset index: paths, building, freshness, and the
//! mmap-backed lookup handle.
//!
//! Layout matches spec.md §3: a bare packed little-endian `u64` array,
//! one entry per line, no header/footer/checksum.

mod builder;
mod freshness;
mod handle;

pub use builder::build_index;
pub use freshness::{is_fresh, Freshness};
pub use handle::IndexHandle;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The canonical index path for a data file: `<data>.index`.
pub fn index_path(data_path: &Path) -> PathBuf {
    append_suffix(data_path, ".index")
}

/// The build-in-progress path: `<data>.index.tmp`.
pub fn tmp_path(data_path: &Path) -> PathBuf {
    append_suffix(data_path, ".index.tmp")
}

/// A sentinel path used to serialize concurrent rebuilders: `<data>.index.lock`.
pub fn lock_path(data_path: &Path) -> PathBuf {
    append_suffix(data_path, ".index.lock")
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to stat {path:?}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to scan data file {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write index {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to atomically rename {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open index {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to mmap index {path:?}: {source}")]
    Mmap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("index file {path:?} has size {size}, which is not a multiple of 8")]
    Malformed { path: PathBuf, size: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_sibling_paths() {
        let data = Path::new("/srv/data/dummy.txt");
        assert_eq!(index_path(data), Path::new("/srv/data/dummy.txt.index"));
        assert_eq!(tmp_path(data), Path::new("/srv/data/dummy.txt.index.tmp"));
        assert_eq!(lock_path(data), Path::new("/srv/data/dummy.txt.index.lock"));
    }
}
