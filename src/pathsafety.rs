//! Path-traversal protection.
//!
//! spec.md §9 flags the original's approach — a string-prefix check of
//! `realpath(data) ` against the current working directory — as weak: it
//! lets `/cwdX` pass a check meant for descendants of `/cwd`. This module
//! instead compares canonicalized path *components*, so the boundary
//! falls on a path separator rather than an arbitrary byte.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to canonicalize {path:?}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "SECURITY: data path {data:?} resolves to {resolved:?}, which is not a descendant of \
         the working directory {cwd:?}"
    )]
    Escapes {
        data: PathBuf,
        resolved: PathBuf,
        cwd: PathBuf,
    },
}

/// Verifies that `data_path`, after symlink resolution, is a descendant of
/// the process's current working directory. Returns the canonicalized
/// path on success.
pub fn ensure_within_cwd(data_path: &Path) -> Result<PathBuf, Error> {
    let cwd = std::env::current_dir().map_err(|source| Error::Canonicalize {
        path: PathBuf::from("."),
        source,
    })?;
    let cwd = std::fs::canonicalize(&cwd).map_err(|source| Error::Canonicalize {
        path: cwd,
        source,
    })?;
    let resolved = std::fs::canonicalize(data_path).map_err(|source| Error::Canonicalize {
        path: data_path.to_path_buf(),
        source,
    })?;

    let mut cwd_components = cwd.components();
    let mut resolved_components = resolved.components();
    loop {
        match cwd_components.next() {
            None => break,
            Some(expected) => match resolved_components.next() {
                Some(actual) if actual == expected => continue,
                _ => {
                    return Err(Error::Escapes {
                        data: data_path.to_path_buf(),
                        resolved,
                        cwd,
                    })
                }
            },
        }
    }
    // Every component of `cwd` matched a component of `resolved` in order.
    // `resolved` must still have at least one further component (the file
    // itself) to be a strict descendant rather than the directory itself.
    match resolved_components.next() {
        Some(Component::Normal(_)) | Some(Component::CurDir) => Ok(resolved),
        _ => Err(Error::Escapes {
            data: data_path.to_path_buf(),
            resolved,
            cwd,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::fs;
    use std::sync::Mutex;

    // `std::env::set_current_dir` is process-global; serialize the tests
    // that touch it so they don't race under the default parallel runner.
    static CWD_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn accepts_descendant() {
        let _guard = CWD_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("data.txt");
        fs::write(&sub, b"hello\n").unwrap();
        let old_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let result = ensure_within_cwd(Path::new("data.txt"));
        std::env::set_current_dir(old_cwd).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_sibling_with_shared_prefix() {
        // Regression test for the weak prefix-string check the spec calls
        // out: a directory named "<cwd>X" must not be treated as a
        // descendant of "<cwd>".
        let _guard = CWD_LOCK.lock().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let cwd_dir = parent.path().join("cwd");
        let sibling_dir = parent.path().join("cwdX");
        fs::create_dir(&cwd_dir).unwrap();
        fs::create_dir(&sibling_dir).unwrap();
        let evil = sibling_dir.join("secret.txt");
        fs::write(&evil, b"nope\n").unwrap();

        let old_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(&cwd_dir).unwrap();
        let result = ensure_within_cwd(&evil);
        std::env::set_current_dir(old_cwd).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_outside_cwd() {
        let _guard = CWD_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let evil = outside.path().join("data.txt");
        fs::write(&evil, b"hello\n").unwrap();

        let old_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let result = ensure_within_cwd(&evil);
        std::env::set_current_dir(old_cwd).unwrap();
        assert!(result.is_err());
    }
}
