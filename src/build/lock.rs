//! One build per working directory.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};

/// Exclusive marker file held for the duration of a build.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    /// Create the lock file, failing with [`BuildError::Busy`] if it exists.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(BuildError::Busy(path.to_path_buf()));
            }
            Err(source) => {
                return Err(BuildError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        // Owner pid, for humans inspecting a stale lock.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            tracing::warn!(path = %path.display(), error = %e, "failed to record pid in build lock");
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to release build lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".pybundle.lock");

        let lock = BuildLock::acquire(&path).unwrap();
        let err = BuildLock::acquire(&path).unwrap_err();
        assert!(matches!(err, BuildError::Busy(_)));

        drop(lock);
        assert!(!path.exists());
        BuildLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_lock_records_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let _lock = BuildLock::acquire(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }
}
