//! Component C — the freshness check.
//!
//! Decides whether the on-disk index can be reused, purely from
//! filesystem metadata: no bytes of either file are read. Mirrors the
//! `load_index`/`build_index` fork in `original_source/app.py`, but
//! replaces its "does `.index` exist at all" check with the mtime
//! comparison spec.md §3/§4.C actually requires.

use super::{index_path, Error};
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The index is missing, empty, or older than the data file.
    Stale,
    /// The index may be reused; `line_count` is derived from its size.
    Fresh { line_count: u64 },
}

/// Checks whether `<data_path>.index` is fresh relative to `data_path`.
pub fn is_fresh(data_path: &Path) -> Result<Freshness, Error> {
    let data_meta = std::fs::metadata(data_path).map_err(|source| Error::Stat {
        path: data_path.to_path_buf(),
        source,
    })?;
    let idx_path = index_path(data_path);
    let idx_meta = match std::fs::metadata(&idx_path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Freshness::Stale),
        Err(source) => {
            return Err(Error::Stat {
                path: idx_path,
                source,
            })
        }
    };

    let idx_size = idx_meta.len();
    if idx_size == 0 {
        return Ok(Freshness::Stale);
    }

    let data_mtime = mtime(&data_meta);
    let idx_mtime = mtime(&idx_meta);
    if idx_mtime < data_mtime {
        return Ok(Freshness::Stale);
    }

    Ok(Freshness::Fresh {
        line_count: idx_size / 8,
    })
}

fn mtime(meta: &std::fs::Metadata) -> SystemTime {
    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;

    #[test]
    fn missing_index_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, b"a\nb\n").unwrap();
        assert_eq!(is_fresh(&data).unwrap(), Freshness::Stale);
    }

    #[test]
    fn empty_index_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, b"a\nb\n").unwrap();
        fs::write(index_path(&data), b"").unwrap();
        assert_eq!(is_fresh(&data).unwrap(), Freshness::Stale);
    }

    #[test]
    fn older_index_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, b"a\nb\n").unwrap();
        fs::write(index_path(&data), 0u64.to_le_bytes()).unwrap();

        let old = FileTime::from_unix_time(1, 0);
        set_file_mtime(index_path(&data), old).unwrap();
        let newer = FileTime::from_unix_time(1_000_000, 0);
        set_file_mtime(&data, newer).unwrap();

        assert_eq!(is_fresh(&data).unwrap(), Freshness::Stale);
    }

    #[test]
    fn fresh_index_reports_line_count_from_size() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, b"a\nb\nc\n").unwrap();
        let mut bytes = Vec::new();
        for off in [0u64, 2, 4] {
            bytes.extend_from_slice(&off.to_le_bytes());
        }
        fs::write(index_path(&data), &bytes).unwrap();

        let old = FileTime::from_unix_time(1, 0);
        set_file_mtime(&data, old).unwrap();
        let newer = FileTime::from_unix_time(1_000_000, 0);
        set_file_mtime(index_path(&data), newer).unwrap();

        assert_eq!(is_fresh(&data).unwrap(), Freshness::Fresh { line_count: 3 });
    }
}
