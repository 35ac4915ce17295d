//! Working directory checks (inputs, permissions, leftover state).

use std::path::Path;

use crate::build::layout::LOCK_FILENAME;
use crate::config::Config;

use super::types::CheckResult;
use super::validators::{has_python_extension, validate_entry_point, validate_manifest};

/// Check the working directory is ready for a build.
pub fn check_build_environment(config: &Config, entry: Option<&Path>) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let work_dir = &config.work_dir;

    // Check working directory is writable
    let test_file = work_dir.join(".pybundle-preflight-test");
    match std::fs::write(&test_file, "test") {
        Ok(_) => {
            if let Err(e) = std::fs::remove_file(&test_file) {
                tracing::warn!(path = %test_file.display(), error = %e, "failed to remove write test file");
            }
            results.push(CheckResult::pass("working directory writable"));
        }
        Err(e) => results.push(CheckResult::fail(
            "working directory writable",
            &format!("Cannot write to {}: {}", work_dir.display(), e),
        )),
    }

    // Manifest
    let manifest = &config.requirements;
    if !config.install_deps {
        results.push(CheckResult::skip("manifest", "dependency install disabled"));
    } else if !manifest.exists() {
        results.push(CheckResult::fail(
            "manifest",
            &format!("{} not found", manifest.display()),
        ));
    } else {
        match validate_manifest(manifest) {
            Ok(0) => results.push(CheckResult::warn(
                "manifest",
                "No requirements listed - only the standard library will be bundled",
            )),
            Ok(n) => results.push(CheckResult::pass_with(
                "manifest",
                &format!("{} requirement(s)", n),
            )),
            Err(e) => results.push(CheckResult::fail("manifest", &e)),
        }
    }

    // Entry point
    match entry {
        None => results.push(CheckResult::skip("entry point", "none given")),
        Some(entry) => {
            let path = config.resolve(entry);
            match validate_entry_point(&path) {
                Ok(lines) if has_python_extension(&path) => results.push(
                    CheckResult::pass_with("entry point", &format!("{} lines", lines)),
                ),
                Ok(_) => results.push(CheckResult::warn(
                    "entry point",
                    "No .py extension - the packager may not recognize it",
                )),
                Err(e) => results.push(CheckResult::fail(
                    "entry point",
                    &format!("{}: {}", path.display(), e),
                )),
            }
        }
    }

    // Leftover state from a failed or interrupted run
    let stale: Vec<String> = [&config.env_dir, &config.build_dir, &config.dist_dir]
        .into_iter()
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if stale.is_empty() {
        results.push(CheckResult::pass("no stale build state"));
    } else {
        results.push(CheckResult::warn(
            "no stale build state",
            &format!("{} will be replaced (run `pybundle clean`)", stale.join(", ")),
        ));
    }

    let lock = work_dir.join(LOCK_FILENAME);
    if lock.exists() {
        results.push(CheckResult::warn(
            "build lock",
            &format!(
                "{} exists - another build is running, or a crashed one left it behind (`pybundle clean --force`)",
                lock.display()
            ),
        ));
    } else {
        results.push(CheckResult::pass("build lock"));
    }

    results
}
