//! Where every file of a build lives.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::{BuildError, Result};

/// Lock file marking a build in progress.
pub const LOCK_FILENAME: &str = ".pybundle.lock";

/// Paths touched by one build of one entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Entry-point script, resolved against the working directory.
    pub entry: PathBuf,
    /// Entry-point file name without its extension.
    pub stem: String,
    pub work_dir: PathBuf,
    pub env_dir: PathBuf,
    pub build_dir: PathBuf,
    pub dist_dir: PathBuf,
    /// Packager metadata file (`<stem>.spec`).
    pub spec_file: PathBuf,
    pub lock_file: PathBuf,
}

impl BuildLayout {
    /// Compute the layout for `entry` under `config`.
    ///
    /// Returns `None` if the entry point has no usable file stem.
    pub fn new(config: &Config, entry: &Path) -> Option<Self> {
        let entry = config.resolve(entry);
        let stem = entry.file_stem()?.to_str()?.to_string();
        if stem.is_empty() {
            return None;
        }

        Some(Self {
            spec_file: config.work_dir.join(format!("{}.spec", stem)),
            lock_file: config.work_dir.join(LOCK_FILENAME),
            work_dir: config.work_dir.clone(),
            env_dir: config.env_dir.clone(),
            build_dir: config.build_dir.clone(),
            dist_dir: config.dist_dir.clone(),
            entry,
            stem,
        })
    }

    /// File name of the produced executable.
    pub fn artifact_name(&self) -> String {
        artifact_name(&self.stem)
    }

    /// Where the packager writes the executable.
    pub fn packaged_artifact(&self) -> PathBuf {
        self.dist_dir.join(self.artifact_name())
    }

    /// Where the executable ends up.
    pub fn final_artifact(&self) -> PathBuf {
        self.work_dir.join(self.artifact_name())
    }

    /// Everything removed by the cleanup step.
    pub fn transient_paths(&self) -> Vec<PathBuf> {
        vec![
            self.env_dir.clone(),
            self.build_dir.clone(),
            self.dist_dir.clone(),
            self.spec_file.clone(),
        ]
    }

    /// Paths the cleanup step must never reach.
    pub fn protected_paths(&self, manifest: &Path) -> Vec<PathBuf> {
        vec![
            self.work_dir.clone(),
            self.entry.clone(),
            manifest.to_path_buf(),
        ]
    }

    /// Reject a layout whose transient paths would delete project files.
    pub fn check_transient_paths(&self, manifest: &Path) -> Result<()> {
        check_transient_paths(&self.transient_paths(), &self.protected_paths(manifest))
    }
}

/// Fail if any `transient` path equals or contains a `protected` one.
pub fn check_transient_paths(transient: &[PathBuf], protected: &[PathBuf]) -> Result<()> {
    let protected: Vec<(PathBuf, &PathBuf)> =
        protected.iter().map(|p| (normalize(p), p)).collect();

    for path in transient {
        let normalized = normalize(path);
        if let Some((_, original)) = protected.iter().find(|(p, _)| p.starts_with(&normalized)) {
            return Err(BuildError::UnsafeTransientPath {
                path: path.clone(),
                protected: (*original).clone(),
            });
        }
    }
    Ok(())
}

/// Resolve symlinks where the path exists, otherwise fold `.` and `..`.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `<stem>` plus the platform executable suffix.
pub fn artifact_name(stem: &str) -> String {
    format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
}
