//! Component B — the index builder.
//!
//! Scans the data file once (component A), streams offsets as 8-byte
//! little-endian values to `<data>.index.tmp`, then atomically renames the
//! temporary file over the canonical index path with `rustix::fs::rename`
//! — the rename is what lets existing mmaps of the prior index keep
//! serving against the old inode while a new index is swapped in (spec.md
//! §4.B). Grounded on the same atomic-rename-over-a-`.tmp`-path idiom as
//! tailsrv's own single-writer file tools (`tscat`/`tssync` use `fd_lock`
//! to guarantee they're the only writer before they start appending); here
//! we additionally take an exclusive `fd-lock` on a sentinel path so two
//! racing master processes don't both try to build at once, matching the
//! `FileLock`/`Timeout` guard in `original_source/app.py`.

use super::{index_path, lock_path, tmp_path, Error};
use crate::scanner::scan_lines;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Builds (or rebuilds) the index for `data_path`, returning the number of
/// lines indexed. Guarded by an exclusive lock on `<data>.index.lock` so
/// concurrent master processes don't race; on any error the `.tmp` file is
/// removed and the canonical index is left untouched.
pub fn build_index(data_path: &Path) -> Result<u64, Error> {
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(lock_path(data_path))
        .map_err(|source| Error::Open {
            path: lock_path(data_path),
            source,
        })?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock.write().map_err(|source| Error::Open {
        path: lock_path(data_path),
        source,
    })?;

    match build_index_locked(data_path) {
        Ok(n) => Ok(n),
        Err(e) => {
            let _ = std::fs::remove_file(tmp_path(data_path));
            Err(e)
        }
    }
}

fn build_index_locked(data_path: &Path) -> Result<u64, Error> {
    let data_file = File::open(data_path).map_err(|source| Error::Scan {
        path: data_path.to_path_buf(),
        source,
    })?;

    let tmp = tmp_path(data_path);
    let tmp_file = File::create(&tmp).map_err(|source| Error::Write {
        path: tmp.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(tmp_file);

    let mut write_err = None;
    let count = scan_lines(data_file, |offset| {
        if write_err.is_some() {
            return;
        }
        if let Err(e) = writer.write_all(&offset.to_le_bytes()) {
            write_err = Some(e);
        }
    })
    .map_err(|source| Error::Scan {
        path: data_path.to_path_buf(),
        source,
    })?;
    if let Some(source) = write_err {
        return Err(Error::Write {
            path: tmp.clone(),
            source,
        });
    }
    writer.flush().and_then(|_| writer.get_ref().sync_all()).map_err(|source| Error::Write {
        path: tmp.clone(),
        source,
    })?;
    drop(writer);

    let canonical = index_path(data_path);
    rustix::fs::rename(&tmp, &canonical).map_err(|e| Error::Rename {
        from: tmp,
        to: canonical,
        source: e.into(),
    })?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexHandle;
    use std::fs;

    #[test]
    fn builds_expected_index_for_three_lines() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.txt");
        fs::write(&data_path, b"a\nbb\nccc\n").unwrap();

        let count = build_index(&data_path).unwrap();
        assert_eq!(count, 3);

        let bytes = fs::read(index_path(&data_path)).unwrap();
        assert_eq!(bytes.len(), 24);
        let mut expected = Vec::new();
        for off in [0u64, 2, 5] {
            expected.extend_from_slice(&off.to_le_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.txt");
        fs::write(&data_path, b"one\ntwo\nthree\n").unwrap();

        build_index(&data_path).unwrap();
        let first = fs::read(index_path(&data_path)).unwrap();
        build_index(&data_path).unwrap();
        let second = fs::read(index_path(&data_path)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_file_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("empty.txt");
        fs::write(&data_path, b"").unwrap();

        let count = build_index(&data_path).unwrap();
        assert_eq!(count, 0);
        let bytes = fs::read(index_path(&data_path)).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn temp_file_removed_on_scan_failure() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("missing.txt");
        // Data file doesn't exist; build should fail and leave no tmp file.
        assert!(build_index(&data_path).is_err());
        assert!(!tmp_path(&data_path).exists());
    }

    #[test]
    fn built_index_is_consumable_by_handle() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.txt");
        fs::write(&data_path, b"a\nbb\nccc\n").unwrap();
        build_index(&data_path).unwrap();

        let handle = IndexHandle::open(&index_path(&data_path)).unwrap();
        assert_eq!(handle.len(), 3);
        assert_eq!(handle.offset(0), 0);
        assert_eq!(handle.offset(1), 2);
        assert_eq!(handle.offset(2), 5);
    }
}
