//! Scoped teardown of transient build state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};

/// Removes the build's transient paths when the pipeline leaves its scope.
///
/// On success the caller calls [`CleanupGuard::finish`], which removes
/// everything and reports errors. Any other exit path (an early `?` return
/// or a panic) reaches `Drop`, which removes everything only when
/// `cleanup_on_failure` is set.
#[derive(Debug)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
    cleanup_on_failure: bool,
    armed: bool,
}

impl CleanupGuard {
    pub fn new(paths: Vec<PathBuf>, cleanup_on_failure: bool) -> Self {
        Self {
            paths,
            cleanup_on_failure,
            armed: true,
        }
    }

    /// Remove every path unconditionally.
    ///
    /// All paths are attempted; the first failure is returned.
    pub fn finish(mut self) -> Result<()> {
        self.armed = false;
        let mut first_err = None;
        for path in &self.paths {
            if let Err(source) = remove_path(path) {
                tracing::warn!(path = %path.display(), error = %source, "cleanup failed");
                if first_err.is_none() {
                    first_err = Some(BuildError::Cleanup {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if !self.cleanup_on_failure {
            for path in self.paths.iter().filter(|p| p.exists()) {
                tracing::warn!(path = %path.display(), "left on disk after failed build");
            }
            return;
        }

        for path in &self.paths {
            match remove_path(path) {
                Ok(true) => tracing::info!(path = %path.display(), "removed after failed build"),
                Ok(false) => {}
                Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to remove on drop"),
            }
        }
    }
}

/// Remove a file or directory tree. Returns `Ok(false)` if nothing was there.
pub fn remove_path(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
