//! Moving the packaged executable out of the packager's output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::build::guard::remove_path;

/// Move `from` to `to`, replacing any existing file at `to`.
///
/// A plain rename is tried first. When that fails (typically because the
/// output directory is on another filesystem) the file is copied next to
/// `to`, which keeps its permission bits, then renamed over it. An existing
/// `to` is only replaced once the new copy is complete.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} is a directory", to.display()),
        ));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, "rename failed, copying instead");
            let staging = staging_path(to)?;
            if let Err(e) = fs::copy(from, &staging).and_then(|_| fs::rename(&staging, to)) {
                if let Err(cleanup) = remove_path(&staging) {
                    tracing::warn!(path = %staging.display(), error = %cleanup, "failed to remove partial copy");
                }
                return Err(e);
            }
            fs::remove_file(from)
        }
    }
}

/// Hidden sibling of `to` that receives the copy before it replaces `to`.
fn staging_path(to: &Path) -> io::Result<PathBuf> {
    let name = to.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", to.display()),
        )
    })?;
    let mut staging = std::ffi::OsString::from(".");
    staging.push(name);
    staging.push(".pybundle-tmp");
    Ok(to.with_file_name(staging))
}
