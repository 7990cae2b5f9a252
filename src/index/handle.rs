//! Component D — the index handle.
//!
//! A read-only `rustix::mm::mmap` over the whole index file, exposing O(1)
//! lookup by line number. Per spec.md §4.D this performs no locking: the
//! mapping is immutable for the process's lifetime, and it's the caller's
//! job to bound-check before calling [`IndexHandle::offset`]. Grounded on
//! tailsrv's own reliance on `rustix`'s `mm` feature (declared in
//! `Cargo.toml`) rather than the older `memmap`/`memmap2` crates visible in
//! tailsrv's own historical `src/cache.rs` and `src/index/cache.rs`.

use super::Error;
use rustix::fd::{AsFd, OwnedFd};
use rustix::fs::OFlags;
use rustix::mm::{MapFlags, ProtFlags};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// An immutable, memory-mapped view of an offset index file.
///
/// Ownership: exclusively owned by the process that mapped it (spec.md
/// §3). Dropping it unmaps the region and closes the underlying file
/// descriptor.
pub struct IndexHandle {
    ptr: NonNull<c_void>,
    map_len: usize,
    len: u64,
    _fd: OwnedFd,
}

// The mapping is read-only and never mutated after creation, so sharing a
// `&IndexHandle` across threads within a worker is sound.
unsafe impl Send for IndexHandle {}
unsafe impl Sync for IndexHandle {}

impl IndexHandle {
    /// Opens `index_path` read-only and maps it entirely into memory.
    ///
    /// A zero-byte index still produces a valid, empty handle — `mmap`
    /// can't map zero-length regions, so that case is special-cased to an
    /// empty mapping without calling into `mm::mmap` at all.
    pub fn open(index_path: &Path) -> Result<IndexHandle, Error> {
        let file = rustix::fs::open(
            index_path,
            OFlags::RDONLY | OFlags::CLOEXEC,
            rustix::fs::Mode::empty(),
        )
        .map_err(|e| Error::Open {
            path: index_path.to_path_buf(),
            source: e.into(),
        })?;

        let stat = rustix::fs::fstat(&file).map_err(|e| Error::Stat {
            path: index_path.to_path_buf(),
            source: e.into(),
        })?;
        let size = stat.st_size as u64;
        if size % 8 != 0 {
            return Err(Error::Malformed {
                path: index_path.to_path_buf(),
                size,
            });
        }

        if size == 0 {
            return Ok(IndexHandle {
                ptr: NonNull::dangling(),
                map_len: 0,
                len: 0,
                _fd: file,
            });
        }

        let map_len = size as usize;
        // SAFETY: `file` is a valid, open, read-only fd for the lifetime of
        // the mapping (it's stored alongside the pointer in `_fd`); the
        // mapping is never written through so aliasing is not a concern.
        let ptr = unsafe {
            rustix::mm::mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ,
                MapFlags::PRIVATE,
                file.as_fd(),
                0,
            )
        }
        .map_err(|e| Error::Mmap {
            path: index_path.to_path_buf(),
            source: e.into(),
        })?;
        let ptr = NonNull::new(ptr).expect("mmap returned a null pointer on success");

        Ok(IndexHandle {
            ptr,
            map_len,
            len: size / 8,
            _fd: file,
        })
    }

    fn as_slice(&self) -> &[u8] {
        if self.map_len == 0 {
            return &[];
        }
        // SAFETY: `ptr` points at `map_len` bytes mapped for the lifetime
        // of `self` (the fd and mapping are held alive together), and the
        // mapping is read-only so no concurrent writer can invalidate it.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().cast::<u8>(), self.map_len) }
    }

    /// Total number of indexed lines.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decodes the little-endian offset of line `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()` — callers must bound-check first, per
    /// spec.md §4.D.
    pub fn offset(&self, i: u64) -> u64 {
        assert!(i < self.len, "line index {i} out of bounds ({})", self.len);
        let start = (i * 8) as usize;
        let bytes: [u8; 8] = self.as_slice()[start..start + 8]
            .try_into()
            .expect("slice of exactly 8 bytes");
        u64::from_le_bytes(bytes)
    }

    /// The byte range `[start, end)` of line `i`, given the data file's
    /// total size (needed to bound the last line, which has no successor
    /// offset to subtract from).
    pub fn range(&self, i: u64, data_size: u64) -> (u64, u64) {
        let start = self.offset(i);
        let end = if i + 1 < self.len {
            self.offset(i + 1)
        } else {
            data_size
        };
        (start, end)
    }
}

impl Drop for IndexHandle {
    fn drop(&mut self) {
        if self.map_len > 0 {
            // SAFETY: `ptr`/`map_len` describe exactly the mapping created
            // in `open`, which is only ever unmapped here.
            unsafe {
                let _ = rustix::mm::munmap(self.ptr.as_ptr(), self.map_len);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_index(dir: &Path, offsets: &[u64]) -> PathBuf {
        let path = dir.join("data.txt.index");
        let mut bytes = Vec::new();
        for o in offsets {
            bytes.extend_from_slice(&o.to_le_bytes());
        }
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn reads_offsets_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_index(dir.path(), &[0, 2, 5, 9]);
        let handle = IndexHandle::open(&path).unwrap();
        assert_eq!(handle.len(), 4);
        assert_eq!(handle.offset(0), 0);
        assert_eq!(handle.offset(1), 2);
        assert_eq!(handle.offset(2), 5);
        assert_eq!(handle.offset(3), 9);
    }

    #[test]
    fn range_uses_next_offset_except_for_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_index(dir.path(), &[0, 2, 5]);
        let handle = IndexHandle::open(&path).unwrap();
        assert_eq!(handle.range(0, 9), (0, 2));
        assert_eq!(handle.range(1, 9), (2, 5));
        assert_eq!(handle.range(2, 9), (5, 9));
    }

    #[test]
    fn empty_index_has_zero_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.index");
        fs::write(&path, b"").unwrap();
        let handle = IndexHandle::open(&path).unwrap();
        assert_eq!(handle.len(), 0);
        assert!(handle.is_empty());
    }

    #[test]
    fn malformed_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.index");
        fs::write(&path, [0u8; 5]).unwrap();
        assert!(IndexHandle::open(&path).is_err());
    }

    #[test]
    #[should_panic]
    fn offset_out_of_bounds_panics() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_index(dir.path(), &[0]);
        let handle = IndexHandle::open(&path).unwrap();
        handle.offset(1);
    }
}
