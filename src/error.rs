//! Build pipeline failures.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::build::Stage;

/// Boxed cause carried by failures that come from an external command.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure of one stage of the build pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("entry point not found: {}", .0.display())]
    MissingEntryPoint(PathBuf),

    #[error("entry point file name is not valid UTF-8: {}", .0.display())]
    InvalidEntryName(PathBuf),

    #[error("dependency manifest not found: {}", .0.display())]
    MissingManifest(PathBuf),

    #[error("another build is running in this directory (lock: {})", .0.display())]
    Busy(PathBuf),

    #[error(
        "refusing to use {} as transient build state: it would delete {}",
        .path.display(),
        .protected.display()
    )]
    UnsafeTransientPath { path: PathBuf, protected: PathBuf },

    #[error("failed to remove stale build state at {}", .path.display())]
    StaleState {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create isolated environment at {}", .path.display())]
    EnvironmentCreation {
        path: PathBuf,
        #[source]
        source: Cause,
    },

    #[error("failed to install {what}")]
    DependencyInstall {
        what: String,
        #[source]
        source: Cause,
    },

    #[error("packaging {} failed", .entry.display())]
    Packaging {
        entry: PathBuf,
        #[source]
        source: Cause,
    },

    #[error("packager reported success but produced no executable at {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("failed to move {} to {}", .from.display(), .to.display())]
    FileMove {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// The last stage the pipeline reached before this failure.
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingEntryPoint(_)
            | Self::InvalidEntryName(_)
            | Self::MissingManifest(_)
            | Self::UnsafeTransientPath { .. }
            | Self::Busy(_)
            | Self::StaleState { .. } => Stage::Start,
            Self::EnvironmentCreation { .. } | Self::Io { .. } => Stage::Start,
            Self::DependencyInstall { .. } => Stage::EnvCreated,
            Self::Packaging { .. } | Self::MissingArtifact(_) => Stage::DepsInstalled,
            Self::FileMove { .. } => Stage::Packaged,
            Self::Cleanup { .. } => Stage::Relocated,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
