//! Configuration management for pybundle.
//!
//! Reads configuration from a `.env` file in the working directory and from
//! environment variables. Environment variables take precedence over `.env`,
//! and CLI flags (applied by the caller) take precedence over both.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Host interpreter used to create the venv when nothing else is configured.
#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

/// Dependency manifest read by `pip install -r`.
pub const DEFAULT_REQUIREMENTS: &str = "requirements.txt";
/// Directory of the disposable venv.
pub const DEFAULT_ENV_DIR: &str = ".venv";
/// pip requirement for the packaging tool.
pub const DEFAULT_PACKAGER: &str = "pyinstaller";
/// Packager scratch directory.
pub const DEFAULT_BUILD_DIR: &str = "build";
/// Packager output directory.
pub const DEFAULT_DIST_DIR: &str = "dist";

/// pybundle configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory the build runs in; receives the final executable.
    pub work_dir: PathBuf,
    /// Host interpreter used for `-m venv`.
    pub python: String,
    /// Dependency manifest.
    pub requirements: PathBuf,
    /// Venv directory.
    pub env_dir: PathBuf,
    /// pip requirement spec for the packager (e.g. `pyinstaller==6.3.0`).
    pub packager: String,
    /// Packager work directory.
    pub build_dir: PathBuf,
    /// Packager output directory.
    pub dist_dir: PathBuf,
    /// Tear down transient state when a stage fails.
    pub cleanup_on_failure: bool,
    /// Install the manifest's dependencies (step 4).
    pub install_deps: bool,
    /// Extra arguments appended to the packager command line.
    pub packager_args: Vec<String>,
    /// Stream child process output instead of capturing it.
    pub verbose: bool,
}

impl Config {
    /// Load configuration for `work_dir` from `.env` and the environment.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let mut vars = HashMap::new();

        let env_path = work_dir.join(".env");
        if env_path.is_file() {
            let entries = dotenvy::from_path_iter(&env_path)
                .with_context(|| format!("Failed to read {}", env_path.display()))?;
            for entry in entries {
                let (key, value) = entry
                    .with_context(|| format!("Malformed line in {}", env_path.display()))?;
                vars.insert(key, value);
            }
        }

        // Environment variables override .env file. Non-UTF-8 entries
        // cannot be PYBUNDLE_* settings and are skipped.
        vars.extend(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }));

        Self::from_vars(work_dir, &vars)
    }

    /// Build configuration from an explicit variable map.
    pub fn from_vars(work_dir: &Path, vars: &HashMap<String, String>) -> Result<Self> {
        let path_var = |key: &str, default: &str| {
            let path = PathBuf::from(vars.get(key).map(String::as_str).unwrap_or(default));
            if path.is_absolute() {
                path
            } else {
                work_dir.join(path)
            }
        };

        let cleanup_on_failure = match vars.get("PYBUNDLE_CLEANUP_ON_FAILURE") {
            Some(value) => parse_bool(value)
                .context("Invalid PYBUNDLE_CLEANUP_ON_FAILURE")?,
            None => true,
        };

        Ok(Self {
            work_dir: work_dir.to_path_buf(),
            python: vars
                .get("PYBUNDLE_PYTHON")
                .cloned()
                .unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            requirements: path_var("PYBUNDLE_REQUIREMENTS", DEFAULT_REQUIREMENTS),
            env_dir: path_var("PYBUNDLE_ENV_DIR", DEFAULT_ENV_DIR),
            packager: vars
                .get("PYBUNDLE_PACKAGER")
                .cloned()
                .unwrap_or_else(|| DEFAULT_PACKAGER.to_string()),
            build_dir: path_var("PYBUNDLE_BUILD_DIR", DEFAULT_BUILD_DIR),
            dist_dir: path_var("PYBUNDLE_DIST_DIR", DEFAULT_DIST_DIR),
            cleanup_on_failure,
            install_deps: true,
            packager_args: Vec::new(),
            verbose: false,
        })
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  WORK_DIR: {}", self.work_dir.display());
        println!("  PYBUNDLE_PYTHON: {}", self.python);
        println!("  PYBUNDLE_REQUIREMENTS: {}", self.requirements.display());
        println!("  PYBUNDLE_ENV_DIR: {}", self.env_dir.display());
        println!("  PYBUNDLE_PACKAGER: {}", self.packager);
        println!("  PYBUNDLE_BUILD_DIR: {}", self.build_dir.display());
        println!("  PYBUNDLE_DIST_DIR: {}", self.dist_dir.display());
        println!("  PYBUNDLE_CLEANUP_ON_FAILURE: {}", self.cleanup_on_failure);
        if self.requirements.is_file() {
            println!("  Manifest: FOUND");
        } else {
            println!("  Manifest: NOT FOUND");
        }
    }
}

/// Parse a boolean setting (`true/false`, `1/0`, `yes/no`, `on/off`).
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got '{}'", other),
    }
}
