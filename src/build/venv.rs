//! The disposable Python environment.
//!
//! "Activation" here is not a shell side effect: an [`Activation`] is a value
//! that stamps the venv's interpreter and environment variables onto each
//! command it builds. Dropping it (or calling [`Activation::deactivate`])
//! ends the scope.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

#[cfg(windows)]
const SCRIPTS_DIR: &str = "Scripts";
#[cfg(not(windows))]
const SCRIPTS_DIR: &str = "bin";

/// A created virtual environment.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    root: PathBuf,
}

impl VirtualEnv {
    /// Create a venv at `root` using the host interpreter `python`.
    pub fn create(python: &str, root: &Path, work_dir: &Path) -> Result<Self> {
        Cmd::new(python)
            .args(["-m", "venv"])
            .arg_path(root)
            .dir(work_dir)
            .error_msg(format!("'{} -m venv' failed", python))
            .run()?;

        let env = Self::open(root);
        if !env.interpreter().exists() {
            anyhow::bail!(
                "venv created but has no interpreter at {}",
                env.interpreter().display()
            );
        }
        Ok(env)
    }

    /// Refer to an existing venv without checking it.
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the venv's executables.
    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join(SCRIPTS_DIR)
    }

    /// The venv's own interpreter.
    pub fn interpreter(&self) -> PathBuf {
        self.scripts_dir()
            .join(format!("python{}", std::env::consts::EXE_SUFFIX))
    }

    /// Scope subsequent commands to this environment.
    pub fn activate(&self) -> Result<Activation<'_>> {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let path = std::env::join_paths(
            std::iter::once(self.scripts_dir()).chain(std::env::split_paths(&inherited)),
        )
        .context("venv scripts directory cannot be placed on PATH")?;

        tracing::debug!(venv = %self.root.display(), "activated");
        Ok(Activation { env: self, path })
    }
}

/// Commands built through this value run inside the venv.
#[derive(Debug)]
pub struct Activation<'a> {
    env: &'a VirtualEnv,
    path: OsString,
}

impl Activation<'_> {
    /// `python <args>` with the venv's interpreter and variables.
    pub fn python(&self) -> Cmd {
        Cmd::new(self.env.interpreter())
            .env("VIRTUAL_ENV", self.env.root())
            .env("PATH", &self.path)
            .env_remove("PYTHONHOME")
    }

    /// `python -m pip install <requirement>`.
    pub fn pip_install(&self, requirement: &str, work_dir: &Path) -> Cmd {
        self.python()
            .args(["-m", "pip", "install", "--disable-pip-version-check"])
            .arg(requirement)
            .dir(work_dir)
    }

    /// `python -m pip install -r <manifest>`.
    pub fn pip_install_manifest(&self, manifest: &Path, work_dir: &Path) -> Cmd {
        self.python()
            .args(["-m", "pip", "install", "--disable-pip-version-check", "-r"])
            .arg_path(manifest)
            .dir(work_dir)
    }

    /// End the activation scope.
    pub fn deactivate(self) {
        tracing::debug!(venv = %self.env.root.display(), "deactivated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_path() {
        let env = VirtualEnv::open(Path::new("/work/.venv"));
        let expected = Path::new("/work/.venv")
            .join(SCRIPTS_DIR)
            .join(format!("python{}", std::env::consts::EXE_SUFFIX));
        assert_eq!(env.interpreter(), expected);
    }

    #[test]
    fn test_pip_install_command_line() {
        let env = VirtualEnv::open(Path::new("/work/.venv"));
        let activation = env.activate().unwrap();
        let line = activation
            .pip_install("pyinstaller", Path::new("/work"))
            .display();
        assert!(line.ends_with("-m pip install --disable-pip-version-check pyinstaller"));
        assert!(line.starts_with(&env.interpreter().to_string_lossy().into_owned()));
    }

    #[cfg(unix)]
    #[test]
    fn test_activation_prepends_scripts_dir() {
        let dir = tempfile::tempdir().unwrap();
        let env = VirtualEnv::open(dir.path());
        std::fs::create_dir_all(env.scripts_dir()).unwrap();
        std::os::unix::fs::symlink("/bin/sh", env.interpreter()).unwrap();

        let activation = env.activate().unwrap();
        let result = activation
            .python()
            .args(["-c", "echo \"$VIRTUAL_ENV|${PATH%%:*}\""])
            .run()
            .unwrap();
        activation.deactivate();

        let expected = format!("{}|{}", dir.path().display(), env.scripts_dir().display());
        assert_eq!(result.stdout_trimmed(), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_create_fails_without_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let err = VirtualEnv::create("nonexistent_python_12345", &dir.path().join(".venv"), dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("Is it installed?"));
    }
}
