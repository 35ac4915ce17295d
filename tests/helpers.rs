//! Shared test utilities for pybundle tests.
//!
//! Builds run against a scripted stand-in for the Python interpreter. It
//! understands `-m venv`, `-m pip install` and `-m PyInstaller` well enough
//! to reproduce the on-disk effects of each step, and appends every
//! invocation to a log file.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pybundle::Config;
use tempfile::TempDir;

/// Requirement name the fake pip refuses to install.
pub const UNINSTALLABLE: &str = "does-not-exist";

/// An entry point importing this module fails to package.
pub const MISSING_MODULE: &str = "missing_module";

const FAKE_PYTHON: &str = r##"#!/bin/sh
echo "$*" >> "@LOG@"
if [ "$1" = "--version" ]; then
  echo "Python 3.12.0"
  exit 0
fi
if [ "$1" != "-m" ]; then
  echo "fake python: unsupported invocation: $*" >&2
  exit 2
fi
mod="$2"
shift 2
case "$mod" in
  venv)
    if [ "$1" = "--help" ]; then
      exit 0
    fi
    mkdir -p "$1/bin" || exit 1
    cp "$0" "$1/bin/python" || exit 1
    chmod +x "$1/bin/python"
    ;;
  pip)
    if [ -z "$VIRTUAL_ENV" ]; then
      echo "pip invoked outside a venv" >&2
      exit 1
    fi
    prev=""
    for a in "$@"; do
      if [ "$prev" = "-r" ] && grep -q "@UNINSTALLABLE@" "$a"; then
        echo "ERROR: No matching distribution found for @UNINSTALLABLE@" >&2
        exit 1
      fi
      prev="$a"
    done
    ;;
  PyInstaller)
    name=""
    dist=""
    work=""
    specpath=""
    entry=""
    while [ $# -gt 0 ]; do
      case "$1" in
        --name) name="$2"; shift 2 ;;
        --distpath) dist="$2"; shift 2 ;;
        --workpath) work="$2"; shift 2 ;;
        --specpath) specpath="$2"; shift 2 ;;
        --*) shift ;;
        *) entry="$1"; shift ;;
      esac
    done
    mkdir -p "$work/$name" "$dist"
    echo "# spec for $name" > "$specpath/$name.spec"
    if grep -q "^import @MISSING_MODULE@" "$entry"; then
      echo "ModuleNotFoundError: No module named '@MISSING_MODULE@'" >&2
      exit 1
    fi
    printf '#!/bin/sh\necho built from %s\n' "$name" > "$dist/$name"
    chmod +x "$dist/$name"
    ;;
  *)
    echo "fake python: unknown module $mod" >&2
    exit 2
    ;;
esac
"##;

/// Temporary project directory plus a fake interpreter outside it.
pub struct TestEnv {
    /// Kept alive for the lifetime of the test
    pub _project: TempDir,
    pub _tools: TempDir,
    /// Working directory of the build
    pub work_dir: PathBuf,
    /// Fake host interpreter
    pub python: PathBuf,
    /// Every fake interpreter invocation, one per line
    pub log: PathBuf,
}

impl TestEnv {
    /// Project with a `requirements.txt` listing `openpyxl`.
    pub fn new() -> Self {
        let project = TempDir::new().expect("Failed to create project dir");
        let tools = TempDir::new().expect("Failed to create tools dir");

        let log = tools.path().join("python.log");
        let python = tools.path().join("python3");
        let script = FAKE_PYTHON
            .replace("@LOG@", &log.to_string_lossy())
            .replace("@UNINSTALLABLE@", UNINSTALLABLE)
            .replace("@MISSING_MODULE@", MISSING_MODULE);
        fs::write(&python, script).expect("Failed to write fake python");
        fs::set_permissions(&python, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake python");

        let work_dir = project.path().to_path_buf();
        fs::write(work_dir.join("requirements.txt"), "openpyxl\n")
            .expect("Failed to write requirements");

        Self {
            _project: project,
            _tools: tools,
            work_dir,
            python,
            log,
        }
    }

    /// Configuration pointing at the fake interpreter.
    pub fn config(&self) -> Config {
        let mut config =
            Config::from_vars(&self.work_dir, &HashMap::new()).expect("default config");
        config.python = self.python.to_string_lossy().into_owned();
        config
    }

    /// Write a script into the project and return its relative path.
    pub fn write_entry(&self, name: &str, body: &str) -> PathBuf {
        fs::write(self.work_dir.join(name), body).expect("Failed to write entry point");
        PathBuf::from(name)
    }

    /// Names of everything in the project directory, sorted.
    pub fn listing(&self) -> Vec<String> {
        list_dir(&self.work_dir)
    }

    /// Logged interpreter invocations.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Assert that a path exists.
pub fn assert_exists(path: &Path) {
    assert!(path.exists(), "Expected {} to exist", path.display());
}

/// Assert that a path does not exist.
pub fn assert_absent(path: &Path) {
    assert!(!path.exists(), "Expected {} to be removed", path.display());
}
