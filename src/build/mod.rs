//! The build pipeline.
//!
//! One build turns one entry-point script into one standalone executable:
//!
//! 1. create a venv (removing stale state from an earlier run first)
//! 2. activate it
//! 3. install the packager
//! 4. install the dependency manifest
//! 5. package the entry point in one-file mode
//! 6. deactivate
//! 7. move the executable into the working directory
//! 8. remove the venv, the packager's directories and the `.spec` file
//!
//! Steps 1-7 run under a [`CleanupGuard`], so step 8 also happens when a
//! step fails, unless `cleanup_on_failure` is off.

pub mod guard;
pub mod layout;
pub mod lock;
pub mod packager;
pub mod relocate;
pub mod report;
pub mod venv;

use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::error::{BuildError, Result};
use crate::process::Cmd;
use crate::timing::Timer;

pub use guard::CleanupGuard;
pub use layout::BuildLayout;
pub use lock::BuildLock;
pub use report::BuildReport;
pub use venv::VirtualEnv;

/// Pipeline progress, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    EnvCreated,
    DepsInstalled,
    Packaged,
    Relocated,
    CleanedUp,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::EnvCreated => "environment created",
            Stage::DepsInstalled => "dependencies installed",
            Stage::Packaged => "packaged",
            Stage::Relocated => "relocated",
            Stage::CleanedUp => "cleaned up",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Build `entry` into a standalone executable in `config.work_dir`.
pub fn run_build(config: &Config, entry: &Path) -> Result<BuildReport> {
    let layout = match BuildLayout::new(config, entry) {
        Some(layout) => layout,
        None if config.resolve(entry).is_file() => {
            return Err(BuildError::InvalidEntryName(entry.to_path_buf()))
        }
        None => return Err(BuildError::MissingEntryPoint(entry.to_path_buf())),
    };

    // Nothing on disk changes until the inputs are known good.
    if !layout.entry.is_file() {
        return Err(BuildError::MissingEntryPoint(layout.entry));
    }
    if config.install_deps && !config.requirements.is_file() {
        return Err(BuildError::MissingManifest(config.requirements.clone()));
    }
    layout.check_transient_paths(&config.requirements)?;

    let _span = tracing::info_span!("build", entry = %layout.stem).entered();
    let _lock = BuildLock::acquire(&layout.lock_file)?;

    for path in layout.transient_paths() {
        if guard::remove_path(&path).map_err(|source| BuildError::StaleState {
            path: path.clone(),
            source,
        })? {
            tracing::info!(path = %path.display(), "removed stale build state");
        }
    }

    let guard = CleanupGuard::new(layout.transient_paths(), config.cleanup_on_failure);
    let mut timings = Vec::new();

    // 1. Isolated environment
    let timer = Timer::start("create environment");
    let env = VirtualEnv::create(&config.python, &layout.env_dir, &layout.work_dir).map_err(
        |e| BuildError::EnvironmentCreation {
            path: layout.env_dir.clone(),
            source: e.into(),
        },
    )?;
    timings.push(timer.finish());
    tracing::info!(stage = %Stage::EnvCreated, venv = %env.root().display());

    // 2. Activate
    let activation = env
        .activate()
        .map_err(|e| BuildError::EnvironmentCreation {
            path: layout.env_dir.clone(),
            source: e.into(),
        })?;

    // 3. Packager
    let timer = Timer::start("install packager");
    execute(
        activation.pip_install(&config.packager, &layout.work_dir),
        config.verbose,
    )
    .map_err(|e| BuildError::DependencyInstall {
        what: config.packager.clone(),
        source: e.into(),
    })?;
    timings.push(timer.finish());

    // 4. Declared dependencies
    if config.install_deps {
        let timer = Timer::start("install dependencies");
        execute(
            activation.pip_install_manifest(&config.requirements, &layout.work_dir),
            config.verbose,
        )
        .map_err(|e| BuildError::DependencyInstall {
            what: config.requirements.display().to_string(),
            source: e.into(),
        })?;
        timings.push(timer.finish());
    } else {
        tracing::info!("skipping dependency manifest");
    }
    tracing::info!(stage = %Stage::DepsInstalled);

    // 5. Package
    let timer = Timer::start("package");
    execute(
        packager::package_command(&activation, &layout, &config.packager_args),
        config.verbose,
    )
    .map_err(|e| BuildError::Packaging {
        entry: layout.entry.clone(),
        source: e.into(),
    })?;
    timings.push(timer.finish());
    tracing::info!(stage = %Stage::Packaged);

    // 6. Deactivate
    activation.deactivate();

    // 7. Relocate
    let packaged = layout.packaged_artifact();
    if !packaged.is_file() {
        return Err(BuildError::MissingArtifact(packaged));
    }
    let artifact = layout.final_artifact();
    relocate::move_file(&packaged, &artifact).map_err(|source| BuildError::FileMove {
        from: packaged.clone(),
        to: artifact.clone(),
        source,
    })?;
    tracing::info!(stage = %Stage::Relocated, artifact = %artifact.display());

    // 8. Cleanup
    let timer = Timer::start("cleanup");
    guard.finish()?;
    timings.push(timer.finish());
    tracing::info!(stage = %Stage::CleanedUp);

    let report =
        BuildReport::new(&layout.entry, &artifact, &timings).map_err(|source| BuildError::Io {
            path: artifact.clone(),
            source,
        })?;
    tracing::info!(stage = %Stage::Done, sha256 = %report.sha256);
    Ok(report)
}

/// Run a pipeline command, streaming its output when `verbose`.
fn execute(cmd: Cmd, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        cmd.run_interactive()?;
    } else {
        cmd.run()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_stages_are_ordered() {
        assert!(Stage::Start < Stage::EnvCreated);
        assert!(Stage::Packaged < Stage::Relocated);
        assert!(Stage::CleanedUp < Stage::Done);
    }

    #[test]
    fn test_missing_entry_point_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "openpyxl\n").unwrap();
        let config = Config::from_vars(dir.path(), &HashMap::new()).unwrap();

        let err = run_build(&config, Path::new("hello.py")).unwrap_err();

        assert!(matches!(err, BuildError::MissingEntryPoint(_)));
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_manifest_is_reported_before_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.py"), "print('hi')\n").unwrap();
        let config = Config::from_vars(dir.path(), &HashMap::new()).unwrap();

        let err = run_build(&config, Path::new("hello.py")).unwrap_err();

        assert!(matches!(err, BuildError::MissingManifest(_)));
        assert!(!config.env_dir.exists());
    }

    #[test]
    fn test_overlapping_dist_dir_leaves_project_intact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.py"), "print('hi')\n").unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "openpyxl\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut config = Config::from_vars(dir.path(), &HashMap::new()).unwrap();
        config.dist_dir = dir.path().to_path_buf();

        let err = run_build(&config, Path::new("hello.py")).unwrap_err();

        assert!(matches!(err, BuildError::UnsafeTransientPath { .. }), "got {:?}", err);
        assert_eq!(err.stage(), Stage::Start);
        assert!(dir.path().join("hello.py").is_file());
        assert!(dir.path().join("notes.txt").is_file());
        assert!(!dir.path().join(layout::LOCK_FILENAME).exists());
    }

    #[test]
    fn test_env_dir_at_work_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.py"), "print('hi')\n").unwrap();
        let mut config = Config::from_vars(dir.path(), &HashMap::new()).unwrap();
        config.install_deps = false;
        config.env_dir = dir.path().join(".");

        let err = run_build(&config, Path::new("hello.py")).unwrap_err();

        assert!(matches!(err, BuildError::UnsafeTransientPath { .. }), "got {:?}", err);
        assert!(dir.path().join("hello.py").is_file());
    }

    // Linux filesystems accept arbitrary bytes in names; APFS does not.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_entry_name_is_not_reported_missing() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let name = std::ffi::OsStr::from_bytes(b"caf\xe9.py");
        std::fs::write(dir.path().join(name), "print('hi')\n").unwrap();
        let mut config = Config::from_vars(dir.path(), &HashMap::new()).unwrap();
        config.install_deps = false;

        let err = run_build(&config, Path::new(name)).unwrap_err();

        assert!(matches!(err, BuildError::InvalidEntryName(_)), "got {:?}", err);
    }

    #[test]
    fn test_busy_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.py"), "print('hi')\n").unwrap();
        let mut config = Config::from_vars(dir.path(), &HashMap::new()).unwrap();
        config.install_deps = false;
        let _held = BuildLock::acquire(&dir.path().join(layout::LOCK_FILENAME)).unwrap();

        let err = run_build(&config, Path::new("hello.py")).unwrap_err();

        assert!(matches!(err, BuildError::Busy(_)));
        assert!(!config.env_dir.exists());
    }
}
